//! Embeds the commit hash and build time into the binary.
//!
//! Both values can be pinned through `CONCH_BUILD_*` env vars for
//! reproducible builds; otherwise they come from git and the clock, with
//! "unknown" markers when neither is available.

use std::env;
use std::fs;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const HASH_VAR: &str = "CONCH_BUILD_GIT_HASH";
const TIMESTAMP_VAR: &str = "CONCH_BUILD_TIMESTAMP";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    watch_head_ref();
    for var in [HASH_VAR, TIMESTAMP_VAR] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let hash = env::var(HASH_VAR)
        .ok()
        .or_else(|| stdout_of("git", &["rev-parse", "--short=12", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let timestamp = env::var(TIMESTAMP_VAR).ok().unwrap_or_else(timestamp_utc);

    println!("cargo:rustc-env={HASH_VAR}={hash}");
    println!("cargo:rustc-env={TIMESTAMP_VAR}={timestamp}");
}

// A rebuild must pick up new commits, so watch the ref HEAD points at.
fn watch_head_ref() {
    let Some(reference) = fs::read_to_string(".git/HEAD")
        .ok()
        .and_then(|head| head.trim().strip_prefix("ref: ").map(str::to_string))
    else {
        return;
    };
    println!("cargo:rerun-if-changed=.git/{reference}");
}

fn timestamp_utc() -> String {
    match stdout_of("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"]) {
        Some(stamp) => stamp,
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|delta| delta.as_secs())
                .unwrap_or(0);
            format!("unix:{secs}")
        }
    }
}

fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
