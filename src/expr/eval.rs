//! Tree-walking interpreter.

use crate::expr::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::expr::value::Value;
use crate::expr::{EvaluationError, Scope};

pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Ident(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvaluationError::Reference(name.clone())),
        Expr::Member { object, property } => {
            let object = eval(object, scope)?;
            let key = eval(property, scope)?.to_display_string();
            get_property(&object, &key)
        }
        Expr::Call { object, method, args } => {
            let target = eval(object, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_method(&target, method, &args)
        }
        Expr::Unary {
            op: UnaryOp::TypeOf,
            operand,
        } if matches!(operand.as_ref(), Expr::Ident(name) if scope.get(name).is_none()) => {
            Ok(Value::from("undefined"))
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
                UnaryOp::TypeOf => Value::String(value.type_name().to_string()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Logical { op, left, right } => {
            let left = eval(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => eval(right, scope),
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval(test, scope)?.is_truthy() {
                eval(consequent, scope)
            } else {
                eval(alternate, scope)
            }
        }
    }
}

fn get_property(object: &Value, key: &str) -> Result<Value, EvaluationError> {
    match object {
        Value::Undefined | Value::Null => Err(EvaluationError::Type(format!(
            "Cannot read properties of {} (reading '{}')",
            object, key
        ))),
        Value::Object(map) => Ok(map.get(key).cloned().unwrap_or_default()),
        Value::Array(items) => Ok(match key {
            "length" => Value::Number(items.len() as f64),
            _ => index(key)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
        }),
        Value::String(s) => Ok(match key {
            "length" => Value::Number(s.encode_utf16().count() as f64),
            // Indexes are UTF-16 code units; a lone surrogate half reads as U+FFFD.
            _ => index(key)
                .and_then(|i| s.encode_utf16().nth(i))
                .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                .unwrap_or_default(),
        }),
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}

fn index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

fn call_method(target: &Value, method: &str, args: &[Value]) -> Result<Value, EvaluationError> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or_default();

    match (target, method) {
        (Value::Undefined | Value::Null, _) => Err(EvaluationError::Type(format!(
            "Cannot read properties of {} (reading '{}')",
            target, method
        ))),
        (Value::String(s), "startsWith") => Ok(Value::Bool(s.starts_with(&arg(0).to_display_string()))),
        (Value::String(s), "endsWith") => Ok(Value::Bool(s.ends_with(&arg(0).to_display_string()))),
        (Value::String(s), "includes") => Ok(Value::Bool(s.contains(&arg(0).to_display_string()))),
        (Value::String(s), "indexOf") => {
            let needle = arg(0).to_display_string();
            Ok(Value::Number(
                s.find(&needle)
                    .map(|byte| s[..byte].encode_utf16().count() as f64)
                    .unwrap_or(-1.0),
            ))
        }
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::Array(items), "includes") => {
            let needle = arg(0);
            Ok(Value::Bool(items.iter().any(|item| same_value_zero(item, &needle))))
        }
        (Value::Array(items), "indexOf") => {
            let needle = arg(0);
            Ok(Value::Number(
                items
                    .iter()
                    .position(|item| item.strict_equals(&needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            ))
        }
        _ => Err(EvaluationError::Type(format!("{} is not a function", method))),
    }
}

// `includes` treats NaN as equal to itself, unlike `===`.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _)
            | (_, Value::String(_))
            | (Value::Array(_) | Value::Object(_), _)
            | (_, Value::Array(_) | Value::Object(_)) => Value::String(format!(
                "{}{}",
                left.to_display_string(),
                right.to_display_string()
            )),
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::Le => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::Ge => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
    }
}

/// Relational comparison: strings compare lexically, everything else numerically.
/// Any comparison involving NaN is false.
fn compare(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => test(a.cmp(b)),
        _ => left
            .to_number()
            .partial_cmp(&right.to_number())
            .is_some_and(test),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse;
    use serde_json::json;

    fn run(source: &str) -> Result<Value, EvaluationError> {
        let scope = Scope::new()
            .with("event", json!({"type": "ping", "id": "42", "data": {"n": 3, "tags": ["a", "b"]}}))
            .with("caseNumber", Value::Number(1.0));
        eval(&parse(source).unwrap(), &scope)
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("event.type === 'ping'"), Ok(Value::Bool(true)));
        assert_eq!(run("event.type !== 'ping'"), Ok(Value::Bool(false)));
        assert_eq!(run("event.id == 42"), Ok(Value::Bool(true)));
        assert_eq!(run("event.id === 42"), Ok(Value::Bool(false)));
        assert_eq!(run("event.data.n > 2 && event.data.n <= 3"), Ok(Value::Bool(true)));
        assert_eq!(run("'b' < 'a'"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_arithmetic_and_concat() {
        assert_eq!(run("1 + 2 * 3"), Ok(Value::Number(7.0)));
        assert_eq!(run("event.id + 1"), Ok(Value::from("421")));
        assert_eq!(run("-event.data.n % 2"), Ok(Value::Number(-1.0)));
        assert_eq!(run("'' + 1e20 === '100000000000000000000'"), Ok(Value::Bool(true)));
        assert_eq!(run("'n' + 1e21"), Ok(Value::from("n1e+21")));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run("event.missing || 'fallback'"), Ok(Value::from("fallback")));
        assert_eq!(run("event.type && event.id"), Ok(Value::from("42")));
        assert_eq!(run("!event.missing"), Ok(Value::Bool(true)));
        assert_eq!(run("caseNumber === 1 ? 'one' : 'other'"), Ok(Value::from("one")));
    }

    #[test]
    fn test_methods_and_indexing() {
        assert_eq!(run("event.type.startsWith('pi')"), Ok(Value::Bool(true)));
        assert_eq!(run("event.data.tags.includes('b')"), Ok(Value::Bool(true)));
        assert_eq!(run("event.data.tags[1]"), Ok(Value::from("b")));
        assert_eq!(run("event.data.tags.length"), Ok(Value::Number(2.0)));
        assert_eq!(run("event['type'].toUpperCase()"), Ok(Value::from("PING")));
        assert_eq!(run("typeof event.data.n"), Ok(Value::from("number")));
    }

    #[test]
    fn test_reference_error() {
        assert_eq!(
            run("foo === 1"),
            Err(EvaluationError::Reference("foo".to_string()))
        );
        assert_eq!(
            run("foo === 1").unwrap_err().to_string(),
            "foo is not defined"
        );
    }

    #[test]
    fn test_typeof_unbound_name() {
        assert_eq!(run("typeof foo"), Ok(Value::from("undefined")));
        assert_eq!(run("typeof foo === 'undefined'"), Ok(Value::Bool(true)));
        assert_eq!(run("typeof caseNumber"), Ok(Value::from("number")));
        assert!(matches!(run("typeof foo.bar"), Err(EvaluationError::Reference(_))));
    }

    #[test]
    fn test_string_units_agree() {
        let scope = Scope::new().with("s", "a\u{1F600}b");
        let run = |source: &str| eval(&parse(source).unwrap(), &scope);
        assert_eq!(run("s.length"), Ok(Value::Number(4.0)));
        assert_eq!(run("s[0]"), Ok(Value::from("a")));
        assert_eq!(run("s[3]"), Ok(Value::from("b")));
        assert_eq!(run("s.indexOf('b')"), Ok(Value::Number(3.0)));
        assert_eq!(run("s[4]"), Ok(Value::Undefined));
    }

    #[test]
    fn test_type_errors() {
        let err = run("event.missing.deeper").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot read properties of undefined (reading 'deeper')"
        );
        assert!(matches!(run("event.data.n.startsWith('x')"), Err(EvaluationError::Type(_))));
    }
}
