//! Native arithmetic on scalars, strings and lists

use crate::capability::{BinaryOp, UnaryOp};
use crate::error::{AcqError, Result};
use crate::value::Value;

fn overflow(op: impl std::fmt::Display) -> AcqError {
    AcqError::Arithmetic(format!("integer overflow in {}", op))
}

/// Largest sequence, in elements or bytes, that repetition may produce
const MAX_REPEAT_LEN: usize = 1 << 28;

fn division_by_zero() -> AcqError {
    AcqError::Arithmetic("division by zero".to_string())
}

fn unsupported_pair(op: BinaryOp, a: &Value, b: &Value) -> AcqError {
    AcqError::unsupported(
        format!("operator {}", op),
        format!("{} and {}", a.type_name(), b.type_name()),
    )
}

fn is_integral(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Bool(_))
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Bool(_) | Value::Float(_))
}

/// Quotient rounded towards negative infinity
fn floor_div(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(division_by_zero());
    }
    let q = a.checked_div(b).ok_or_else(|| overflow(BinaryOp::FloorDiv))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder with the sign of the divisor
fn floor_mod(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(division_by_zero());
    }
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn float_mod(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        return Err(division_by_zero());
    }
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn int_binary(a: i64, op: BinaryOp, b: i64) -> Result<Value> {
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(|| overflow(op))?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(|| overflow(op))?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(|| overflow(op))?,
        BinaryOp::TrueDiv => {
            if b == 0 {
                return Err(division_by_zero());
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => floor_div(a, b)?,
        BinaryOp::Mod => floor_mod(a, b)?,
        BinaryOp::DivMod => {
            return Ok(Value::list(vec![
                Value::Int(floor_div(a, b)?),
                Value::Int(floor_mod(a, b)?),
            ]))
        }
        BinaryOp::Pow => {
            if b < 0 {
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| overflow(op))?;
            a.checked_pow(exp).ok_or_else(|| overflow(op))?
        }
        BinaryOp::LShift => {
            if b < 0 {
                return Err(AcqError::Arithmetic("negative shift count".to_string()));
            }
            if a == 0 {
                0
            } else if b >= 64 {
                return Err(overflow(op));
            } else {
                let shifted = a << b;
                if shifted >> b != a {
                    return Err(overflow(op));
                }
                shifted
            }
        }
        BinaryOp::RShift => {
            if b < 0 {
                return Err(AcqError::Arithmetic("negative shift count".to_string()));
            }
            if b >= 64 {
                if a < 0 {
                    -1
                } else {
                    0
                }
            } else {
                a >> b
            }
        }
        BinaryOp::And => a & b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Or => a | b,
        BinaryOp::MatMul => {
            return Err(unsupported_pair(op, &Value::Int(a), &Value::Int(b)));
        }
    };
    Ok(Value::Int(value))
}

fn float_binary(a: f64, op: BinaryOp, b: f64, lhs: &Value, rhs: &Value) -> Result<Value> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::TrueDiv => {
            if b == 0.0 {
                return Err(division_by_zero());
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(division_by_zero());
            }
            (a / b).floor()
        }
        BinaryOp::Mod => float_mod(a, b)?,
        BinaryOp::DivMod => {
            let r = float_mod(a, b)?;
            return Ok(Value::list(vec![
                Value::Float(((a - r) / b).round()),
                Value::Float(r),
            ]));
        }
        BinaryOp::Pow => a.powf(b),
        _ => return Err(unsupported_pair(op, lhs, rhs)),
    };
    Ok(Value::Float(value))
}

/// Repetition count for a sequence of `len`; negative counts give zero
fn repeat_count(len: usize, times: i64) -> Result<usize> {
    let times = usize::try_from(times).unwrap_or(0);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(AcqError::Arithmetic(format!(
            "repeating {} elements {} times exceeds {}",
            len, times, MAX_REPEAT_LEN
        ))),
    }
}

fn repeat<T: Clone>(items: &[T], times: i64) -> Result<Vec<T>> {
    let times = repeat_count(items.len(), times)?;
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

/// `a <op> b` on unwrapped native values
pub(crate) fn native_binary(a: &Value, op: BinaryOp, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) if matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor) => {
            Ok(Value::Bool(match op {
                BinaryOp::And => x & y,
                BinaryOp::Or => x | y,
                _ => x ^ y,
            }))
        }
        (x, y) if is_integral(x) && is_integral(y) => {
            let (Some(x), Some(y)) = (x.as_int(), y.as_int()) else {
                return Err(unsupported_pair(op, a, b));
            };
            int_binary(x, op, y)
        }
        (x, y) if is_numeric(x) && is_numeric(y) => {
            let (Some(x), Some(y)) = (x.as_float(), y.as_float()) else {
                return Err(unsupported_pair(op, a, b));
            };
            float_binary(x, op, y, a, b)
        }
        (Value::Str(x), Value::Str(y)) if op == BinaryOp::Add => {
            Ok(Value::from(format!("{}{}", x, y)))
        }
        (Value::Str(s), n) | (n, Value::Str(s)) if op == BinaryOp::Mul && is_integral(n) => {
            let times = repeat_count(s.len(), n.as_int().unwrap_or(0))?;
            Ok(Value::from(s.repeat(times)))
        }
        (Value::List(x), Value::List(y)) if op == BinaryOp::Add => {
            let mut items = x.borrow().clone();
            items.extend(y.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::List(l), n) | (n, Value::List(l)) if op == BinaryOp::Mul && is_integral(n) => {
            let items = l.borrow();
            Ok(Value::list(repeat(items.as_slice(), n.as_int().unwrap_or(0))?))
        }
        _ => Err(unsupported_pair(op, a, b)),
    }
}

/// Unary operator on an unwrapped native value
pub(crate) fn native_unary(a: &Value, op: UnaryOp) -> Result<Value> {
    match a {
        Value::Int(_) | Value::Bool(_) => {
            let x = a.as_int().unwrap_or(0);
            let value = match op {
                UnaryOp::Neg => x.checked_neg().ok_or_else(|| overflow(op))?,
                UnaryOp::Pos => x,
                UnaryOp::Abs => x.checked_abs().ok_or_else(|| overflow(op))?,
                UnaryOp::Invert => !x,
            };
            Ok(Value::Int(value))
        }
        Value::Float(x) => match op {
            UnaryOp::Neg => Ok(Value::Float(-x)),
            UnaryOp::Pos => Ok(Value::Float(*x)),
            UnaryOp::Abs => Ok(Value::Float(x.abs())),
            UnaryOp::Invert => Err(AcqError::unsupported(op.to_string(), a.type_name())),
        },
        _ => Err(AcqError::unsupported(op.to_string(), a.type_name())),
    }
}

/// Integer conversion of an unwrapped native value
pub(crate) fn native_to_int(a: &Value) -> Result<i64> {
    match a {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(x) => {
            let truncated = x.trunc();
            if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(AcqError::Arithmetic(format!("cannot convert {} to int", x)));
            }
            Ok(truncated as i64)
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AcqError::Custom(format!("invalid literal for int(): '{}'", s))),
        _ => Err(AcqError::unsupported("int()", a.type_name())),
    }
}

/// Float conversion of an unwrapped native value
pub(crate) fn native_to_float(a: &Value) -> Result<f64> {
    match a {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AcqError::Custom(format!("could not convert string to float: '{}'", s))),
        other => other
            .as_float()
            .ok_or_else(|| AcqError::unsupported("float()", other.type_name())),
    }
}
