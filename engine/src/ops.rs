//! FILENAME: engine/src/ops.rs
//! PURPOSE: Binary and unary operation tables over value variants.
//! CONTEXT: Every operator is defined as a table over the operand types;
//! any combination without a row is a TypedOperation error carrying a
//! human-readable message. Comparisons produce the canonical Float truth
//! values. Both operands of the logical operators are always evaluated by
//! the caller; there is no short-circuiting in either language.

use crate::error::{typed, EvalError};
use crate::value::{consts, Value};
use parser::ast::{BinaryOperator, UnaryOperator};

pub fn binary_op(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => arithmetic(left, right, "subtracting", |a, b| a - b),
        BinaryOperator::Multiply => arithmetic(left, right, "multiplying", |a, b| a * b),
        BinaryOperator::Divide => arithmetic(left, right, "dividing", |a, b| a / b),
        BinaryOperator::Equal => comparison(left, right, |o| o == std::cmp::Ordering::Equal, f64::eq),
        BinaryOperator::NotEqual => {
            comparison(left, right, |o| o != std::cmp::Ordering::Equal, f64::ne)
        }
        BinaryOperator::LessThan => {
            comparison(left, right, |o| o == std::cmp::Ordering::Less, f64::lt)
        }
        BinaryOperator::GreaterThan => {
            comparison(left, right, |o| o == std::cmp::Ordering::Greater, f64::gt)
        }
        BinaryOperator::LessEqual => {
            comparison(left, right, |o| o != std::cmp::Ordering::Greater, f64::le)
        }
        BinaryOperator::GreaterEqual => {
            comparison(left, right, |o| o != std::cmp::Ordering::Less, f64::ge)
        }
        BinaryOperator::And => logical(left, right, "and", |a, b| a && b),
        BinaryOperator::Or => logical(left, right, "or", |a, b| a || b),
    }
}

pub fn unary_op(op: UnaryOperator, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOperator::Negate => match value {
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(typed(format!("Error negating {}.", other.type_name()))),
        },
        UnaryOperator::Not => match value {
            Value::Float(f) => Ok(consts::bool_value(*f == 0.0)),
            other => Err(typed(format!(
                "Error computing logical not of {}.",
                other.type_name()
            ))),
        },
    }
}

/// `+` adds Floats and concatenates Strings.
fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::String(a), Value::String(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::string(s))
        }
        (l, r) => Err(typed(format!(
            "Error adding {} to {}.",
            r.type_name(),
            l.type_name()
        ))),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    verb: &str,
    f: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(f(*a, *b))),
        (l, r) => Err(typed(format!(
            "Error {} {} and {}.",
            verb,
            l.type_name(),
            r.type_name()
        ))),
    }
}

/// Comparisons are defined for Float/Float (IEEE semantics, so NaN
/// compares false against everything including itself) and String/String
/// (lexicographic).
fn comparison(
    left: &Value,
    right: &Value,
    strings: fn(std::cmp::Ordering) -> bool,
    floats: fn(&f64, &f64) -> bool,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => Ok(consts::bool_value(floats(a, b))),
        (Value::String(a), Value::String(b)) => Ok(consts::bool_value(strings(a.cmp(b)))),
        (l, r) => Err(typed(format!(
            "Error comparing {} to {}.",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn logical(
    left: &Value,
    right: &Value,
    verb: &str,
    f: fn(bool, bool) -> bool,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => Ok(consts::bool_value(f(*a != 0.0, *b != 0.0))),
        (l, r) => Err(typed(format!(
            "Error computing logical {} of {} and {}.",
            verb,
            l.type_name(),
            r.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::ast::BinaryOperator as B;
    use parser::ast::UnaryOperator as U;

    fn f(n: f64) -> Value {
        Value::Float(n)
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(binary_op(B::Add, &f(1.0), &f(2.0)).unwrap(), f(3.0));
        assert_eq!(binary_op(B::Subtract, &f(5.0), &f(2.0)).unwrap(), f(3.0));
        assert_eq!(binary_op(B::Multiply, &f(4.0), &f(2.5)).unwrap(), f(10.0));
        assert_eq!(binary_op(B::Divide, &f(9.0), &f(2.0)).unwrap(), f(4.5));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        match binary_op(B::Divide, &f(1.0), &f(0.0)).unwrap() {
            Value::Float(v) => assert!(v.is_infinite()),
            _ => panic!("Expected Float"),
        }
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            binary_op(B::Add, &Value::string("foo"), &Value::string("bar")).unwrap(),
            Value::string("foobar")
        );
    }

    #[test]
    fn test_mixed_addition_is_rejected() {
        let err = binary_op(B::Add, &f(1.0), &Value::string("x")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error adding String to Float."
        );
        assert!(binary_op(B::Subtract, &Value::string("a"), &Value::string("b")).is_err());
        assert!(binary_op(B::Add, &Value::Nil, &f(1.0)).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary_op(B::LessThan, &f(1.0), &f(2.0)).unwrap(), f(1.0));
        assert_eq!(binary_op(B::GreaterEqual, &f(1.0), &f(2.0)).unwrap(), f(0.0));
        assert_eq!(binary_op(B::Equal, &f(2.0), &f(2.0)).unwrap(), f(1.0));
        assert_eq!(
            binary_op(B::LessThan, &Value::string("a"), &Value::string("b")).unwrap(),
            f(1.0)
        );
        assert!(binary_op(B::Equal, &f(1.0), &Value::string("1")).is_err());
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let nan = f(f64::NAN);
        assert_eq!(binary_op(B::Equal, &nan, &nan).unwrap(), f(0.0));
        assert_eq!(binary_op(B::NotEqual, &nan, &nan).unwrap(), f(1.0));
        assert_eq!(binary_op(B::LessEqual, &nan, &f(1.0)).unwrap(), f(0.0));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(binary_op(B::And, &f(1.0), &f(0.0)).unwrap(), f(0.0));
        assert_eq!(binary_op(B::And, &f(2.0), &f(3.0)).unwrap(), f(1.0));
        assert_eq!(binary_op(B::Or, &f(0.0), &f(0.0)).unwrap(), f(0.0));
        assert_eq!(binary_op(B::Or, &f(0.0), &f(5.0)).unwrap(), f(1.0));
        assert!(binary_op(B::And, &Value::Nil, &f(1.0)).is_err());
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(unary_op(U::Negate, &f(5.0)).unwrap(), f(-5.0));
        assert_eq!(unary_op(U::Not, &f(0.0)).unwrap(), f(1.0));
        assert_eq!(unary_op(U::Not, &f(3.0)).unwrap(), f(0.0));
        assert!(unary_op(U::Negate, &Value::string("x")).is_err());
    }
}
