//! Tree-walking evaluator over the session's bindings.

use crate::error::ScriptError;

use super::parser::{BinOp, Expr, Stmt, UnaryOp};
use super::{ScriptBindings, Value};

pub struct Evaluator<'a> {
    bindings: &'a mut ScriptBindings,
    out: &'a mut String,
}

impl<'a> Evaluator<'a> {
    pub fn new(bindings: &'a mut ScriptBindings, out: &'a mut String) -> Self {
        Self { bindings, out }
    }

    pub fn emit_line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        match stmt {
            Stmt::Assign(name, expr) => {
                let value = self.eval_value(expr)?;
                self.bindings.set(name, value);
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
        }
    }

    /// Evaluate an expression. `None` means the expression produced no
    /// value (a bare `print` call); the caller then has nothing to echo.
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Option<Value>, ScriptError> {
        match expr {
            Expr::Call(name, args) => self.call(name, args),
            other => self.eval_value(other).map(Some),
        }
    }

    fn eval_value(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => self
                .bindings
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::Eval(format!("name '{name}' is not defined"))),
            Expr::Unary(op, inner) => {
                let value = self.eval_value(inner)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(ScriptError::Eval(format!(
                            "cannot negate {}",
                            other.type_name()
                        ))),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval_value(lhs)?;
                let rhs = self.eval_value(rhs)?;
                binary(*op, lhs, rhs)
            }
            Expr::Call(name, args) => self
                .call(name, args)?
                .ok_or_else(|| ScriptError::Eval(format!("{name}() produces no value"))),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Option<Value>, ScriptError> {
        match name {
            "print" => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.eval_value(arg)?.to_string());
                }
                let line = parts.join(" ");
                self.emit_line(&line);
                Ok(None)
            }
            "len" => match self.arity_one(name, args)? {
                Value::Str(s) => Ok(Some(Value::Int(s.chars().count() as i64))),
                other => Err(ScriptError::Eval(format!(
                    "len() expects str, got {}",
                    other.type_name()
                ))),
            },
            "str" => {
                let value = self.arity_one(name, args)?;
                Ok(Some(Value::Str(value.to_string())))
            }
            "int" => match self.arity_one(name, args)? {
                Value::Int(n) => Ok(Some(Value::Int(n))),
                Value::Float(x) => Ok(Some(Value::Int(x as i64))),
                Value::Bool(b) => Ok(Some(Value::Int(i64::from(b)))),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(|n| Some(Value::Int(n)))
                    .map_err(|_| ScriptError::Eval(format!("cannot convert '{s}' to int"))),
            },
            "float" => match self.arity_one(name, args)? {
                Value::Int(n) => Ok(Some(Value::Float(n as f64))),
                Value::Float(x) => Ok(Some(Value::Float(x))),
                Value::Bool(b) => Ok(Some(Value::Float(f64::from(u8::from(b))))),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(|x| Some(Value::Float(x)))
                    .map_err(|_| ScriptError::Eval(format!("cannot convert '{s}' to float"))),
            },
            "abs" => match self.arity_one(name, args)? {
                Value::Int(n) => Ok(Some(Value::Int(n.abs()))),
                Value::Float(x) => Ok(Some(Value::Float(x.abs()))),
                other => Err(ScriptError::Eval(format!(
                    "abs() expects a number, got {}",
                    other.type_name()
                ))),
            },
            _ => Err(ScriptError::Eval(format!("unknown function '{name}'"))),
        }
    }

    fn arity_one(&mut self, name: &str, args: &[Expr]) -> Result<Value, ScriptError> {
        if args.len() != 1 {
            return Err(ScriptError::Eval(format!(
                "{name}() takes exactly one argument, got {}",
                args.len()
            )));
        }
        self.eval_value(&args[0])
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    use Value::{Float, Int, Str};
    match op {
        BinOp::Add => match (lhs, rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_add(b))),
            (Str(a), Str(b)) => Ok(Str(format!("{a}{b}"))),
            (a, b) => numeric(op, a, b, |x, y| x + y),
        },
        BinOp::Sub => match (lhs, rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_sub(b))),
            (a, b) => numeric(op, a, b, |x, y| x - y),
        },
        BinOp::Mul => match (lhs, rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_mul(b))),
            (a, b) => numeric(op, a, b, |x, y| x * y),
        },
        BinOp::Div => match (lhs, rhs) {
            (_, Int(0)) => Err(ScriptError::Eval("division by zero".into())),
            (_, Float(x)) if x == 0.0 => Err(ScriptError::Eval("division by zero".into())),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_div(b))),
            (a, b) => numeric(op, a, b, |x, y| x / y),
        },
        BinOp::Rem => match (lhs, rhs) {
            (_, Int(0)) => Err(ScriptError::Eval("division by zero".into())),
            (_, Float(x)) if x == 0.0 => Err(ScriptError::Eval("division by zero".into())),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_rem(b))),
            (a, b) => numeric(op, a, b, |x, y| x % y),
        },
        BinOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinOp::NotEq => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
            let ordering = compare(&lhs, &rhs)?;
            let holds = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::LtEq => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::GtEq => ordering.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(holds))
        }
    }
}

fn numeric(
    op: BinOp,
    lhs: Value,
    rhs: Value,
    apply: impl Fn(f64, f64) -> f64,
) -> Result<Value, ScriptError> {
    match (as_f64(&lhs), as_f64(&rhs)) {
        (Some(a), Some(b)) => Ok(Value::Float(apply(a, b))),
        _ => Err(ScriptError::Eval(format!(
            "unsupported operands for {op:?}: {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (as_f64(lhs), as_f64(rhs)) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering, ScriptError> {
    if let (Some(a), Some(b)) = (as_f64(lhs), as_f64(rhs)) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| ScriptError::Eval("values are not comparable".into()));
    }
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    Err(ScriptError::Eval(format!(
        "cannot compare {} and {}",
        lhs.type_name(),
        rhs.type_name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::Parser;
    use crate::script::token::tokenize;

    fn eval(code: &str, bindings: &mut ScriptBindings) -> Result<Option<Value>, ScriptError> {
        let tokens = tokenize(code).expect("tokenize");
        let expr = Parser::new(&tokens)
            .parse_single_expression()
            .expect("parse");
        let mut out = String::new();
        Evaluator::new(bindings, &mut out).eval_expr(&expr)
    }

    fn eval_fresh(code: &str) -> Value {
        eval(code, &mut ScriptBindings::new())
            .expect("eval")
            .expect("value")
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(eval_fresh("7 / 2"), Value::Int(3));
        assert_eq!(eval_fresh("7 % 2"), Value::Int(1));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        assert_eq!(eval_fresh("1 + 2.5"), Value::Float(3.5));
    }

    #[test]
    fn string_concat_requires_strings() {
        assert_eq!(eval_fresh("'a' + 'b'"), Value::Str("ab".into()));
        let err = eval("'a' + 1", &mut ScriptBindings::new()).expect_err("expected type error");
        assert!(err.to_string().contains("unsupported"), "got: {err}");
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(eval_fresh("2 == 2.0"), Value::Bool(true));
    }

    #[test]
    fn unary_not_uses_truthiness() {
        assert_eq!(eval_fresh("!0"), Value::Bool(true));
        assert_eq!(eval_fresh("!'text'"), Value::Bool(false));
    }

    #[test]
    fn builtins_convert_and_measure() {
        assert_eq!(eval_fresh("int('42')"), Value::Int(42));
        assert_eq!(eval_fresh("str(42)"), Value::Str("42".into()));
        assert_eq!(eval_fresh("len('héllo')"), Value::Int(5));
        assert_eq!(eval_fresh("abs(-3)"), Value::Int(3));
    }

    #[test]
    fn print_produces_no_value() {
        let mut bindings = ScriptBindings::new();
        let result = eval("print(1, 2)", &mut bindings).expect("eval");
        assert_eq!(result, None);
    }

    #[test]
    fn unknown_function_is_an_eval_error() {
        let err = eval("bogus(1)", &mut ScriptBindings::new()).expect_err("expected error");
        assert!(err.to_string().contains("unknown function"), "got: {err}");
    }

    #[test]
    fn float_division_by_zero_is_caught() {
        let err = eval("1.0 / 0.0", &mut ScriptBindings::new()).expect_err("expected error");
        assert!(err.to_string().contains("division by zero"), "got: {err}");
    }
}
