//! UTF-8-safe clipping helpers.
//!
//! Output history and context rendering clip captured text for previews.
//! Byte slicing can panic when the cut falls inside a multi-byte character,
//! so clipping goes through these helpers.

/// Marker appended whenever captured output is clipped.
pub const CLIP_MARKER: &str = "...[truncated]";

/// Return a UTF-8-safe prefix whose byte length is at most `max_bytes`.
pub fn clip_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Clip to `max_bytes` and append [`CLIP_MARKER`] when clipping occurs.
pub fn clip_with_marker(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    format!("{}{CLIP_MARKER}", clip_utf8(text, max_bytes))
}

/// First line of `text`, clipped to `max_bytes`, for one-line previews.
pub fn preview_line(text: &str, max_bytes: usize) -> String {
    let first = text.lines().next().unwrap_or("");
    let clipped = clip_utf8(first, max_bytes);
    if clipped.len() < text.trim_end_matches('\n').len() {
        format!("{clipped}{CLIP_MARKER}")
    } else {
        clipped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_utf8_keeps_short_ascii() {
        assert_eq!(clip_utf8("hello", 10), "hello");
    }

    #[test]
    fn clip_utf8_avoids_mid_codepoint_cut() {
        let s = "aé🙂";
        assert_eq!(clip_utf8(s, 2), "a");
        assert_eq!(clip_utf8(s, 3), "aé");
    }

    #[test]
    fn clip_with_marker_handles_unicode() {
        let s = "🙂🙂🙂";
        assert_eq!(clip_with_marker(s, 5), "🙂...[truncated]");
    }

    #[test]
    fn clip_with_marker_no_marker_when_short() {
        assert_eq!(clip_with_marker("ok", 16), "ok");
    }

    #[test]
    fn preview_line_takes_first_line_only() {
        let out = preview_line("line one\nline two\n", 64);
        assert!(out.starts_with("line one"), "got: {out}");
        assert!(!out.contains("line two"));
    }

    #[test]
    fn preview_line_marks_clipped_output() {
        let out = preview_line("abcdefgh", 4);
        assert_eq!(out, "abcd...[truncated]");
    }
}
