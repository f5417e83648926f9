//! Arithmetic, bitwise, and comparison operators over `Int`/`Float`/`Bool` (§4.2).

use camel_types::{Capabilities, ExceptionKind};

use super::{Raw, Value};

/// Binary arithmetic/bitwise operators. `Pow`/`Div` etc. follow Python's
/// type-promotion rules: int⊗int→int except true-division, which is always
/// float; any float operand promotes the whole operation to float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

fn as_f64(v: &Value) -> Option<f64> {
    match v.raw() {
        Raw::Int(i) => Some(*i as f64),
        Raw::Float(f) => Some(*f),
        _ => None,
    }
}

fn is_float(v: &Value) -> bool {
    matches!(v.raw(), Raw::Float(_))
}

/// Evaluate a binary numeric operator. Dependencies of the result are
/// `(lhs, rhs)` per §4.2, metadata is always `camel()`.
pub fn binary_numeric(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, ExceptionKind> {
    let (Some(a), Some(b)) = (as_f64(lhs), as_f64(rhs)) else {
        return Err(ExceptionKind::TypeError(format!(
            "unsupported operand type(s) for {op:?}: '{}' and '{}'",
            lhs.type_name(),
            rhs.type_name()
        )));
    };
    let deps = vec![lhs.clone(), rhs.clone()];
    let meta = Capabilities::camel();

    if op == BinOp::TrueDiv {
        if b == 0.0 {
            return Err(ExceptionKind::ZeroDivisionError);
        }
        return Ok(Value::float(a / b, meta, deps));
    }

    let promote_float = is_float(lhs) || is_float(rhs);

    macro_rules! int_result {
        ($expr:expr) => {
            if promote_float {
                Value::float($expr as f64, meta, deps)
            } else {
                Value::int($expr as i64, meta, deps)
            }
        };
    }

    match op {
        BinOp::Add => Ok(int_result!(a + b)),
        BinOp::Sub => Ok(int_result!(a - b)),
        BinOp::Mult => Ok(int_result!(a * b)),
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExceptionKind::ZeroDivisionError);
            }
            Ok(int_result!((a / b).floor()))
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(ExceptionKind::ZeroDivisionError);
            }
            Ok(int_result!(a.rem_euclid(b)))
        }
        BinOp::Pow => Ok(int_result!(a.powf(b))),
        BinOp::LShift | BinOp::RShift | BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd => {
            if promote_float {
                return Err(ExceptionKind::TypeError(
                    "bitwise operators require int operands".to_string(),
                ));
            }
            let (ai, bi) = (a as i64, b as i64);
            let r = match op {
                BinOp::LShift => ai << bi,
                BinOp::RShift => ai >> bi,
                BinOp::BitOr => ai | bi,
                BinOp::BitXor => ai ^ bi,
                BinOp::BitAnd => ai & bi,
                _ => unreachable!(),
            };
            Ok(Value::int(r, meta, deps))
        }
        BinOp::TrueDiv => unreachable!("handled above"),
    }
}

pub fn unary_numeric(op: UnaryOp, v: &Value) -> Result<Value, ExceptionKind> {
    let deps = vec![v.clone()];
    match (op, v.raw()) {
        (UnaryOp::Neg, Raw::Int(i)) => Ok(Value::int(-i, v.metadata().clone(), deps)),
        (UnaryOp::Neg, Raw::Float(f)) => Ok(Value::float(-f, Capabilities::camel(), deps)),
        (UnaryOp::Pos, Raw::Int(i)) => Ok(Value::int(*i, v.metadata().clone(), deps)),
        (UnaryOp::Pos, Raw::Float(f)) => Ok(Value::float(*f, Capabilities::camel(), deps)),
        (UnaryOp::Invert, Raw::Int(i)) => Ok(Value::int(!i, Capabilities::camel(), deps)),
        (UnaryOp::Invert, Raw::Float(_)) => Err(ExceptionKind::TypeError(
            "bad operand type for unary ~: 'float'".to_string(),
        )),
        (UnaryOp::Not, Raw::Bool(b)) => Ok(Value::bool(!b, Capabilities::camel(), deps)),
        _ => Err(ExceptionKind::TypeError(format!(
            "bad operand type for unary operator: '{}'",
            v.type_name()
        ))),
    }
}

/// Numeric comparison, chainable left-to-right by the interpreter (§4.2).
pub fn compare_numeric(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    as_f64(lhs)?.partial_cmp(&as_f64(rhs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::Capabilities;

    fn int(i: i64) -> Value {
        Value::int(i, Capabilities::camel(), vec![])
    }

    #[test]
    fn add_two_ints_produces_int() {
        let r = binary_numeric(BinOp::Add, &int(2), &int(3)).unwrap();
        assert!(matches!(r.raw(), Raw::Int(5)));
        assert_eq!(r.dependencies().len(), 2);
    }

    #[test]
    fn true_div_always_float() {
        let r = binary_numeric(BinOp::TrueDiv, &int(4), &int(2)).unwrap();
        assert!(matches!(r.raw(), Raw::Float(f) if (*f - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn division_by_zero_is_zero_division_error() {
        let err = binary_numeric(BinOp::TrueDiv, &int(1), &int(0)).unwrap_err();
        assert_eq!(err, ExceptionKind::ZeroDivisionError);
    }

    #[test]
    fn mismatched_types_raise_type_error() {
        let s = Value::str("x", Capabilities::camel(), vec![]);
        assert!(binary_numeric(BinOp::Add, &int(1), &s).is_err());
    }

    #[test]
    fn bitwise_rejects_float_operands() {
        let f = Value::float(1.5, Capabilities::camel(), vec![]);
        assert!(binary_numeric(BinOp::BitOr, &f, &int(1)).is_err());
    }
}
