//! Standard trait implementations on top of the forwarding layer

use crate::api::base;
use crate::capability::{BinaryOp, UnaryOp};
use crate::error::Result;
use crate::protocol;
use crate::value::{rc_addr, Value};
use crate::wrapper::Wrapper;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match protocol::to_str(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => match protocol::native_str(&base(self)) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "<{}>", self.type_name()),
            },
        }
    }
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Value::Wrapper(self.clone()), f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        protocol::equals(self, other).unwrap_or(false)
    }
}

// Reflexive even for NaN: `compare` short-circuits on identity first.
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        protocol::compare(self, other).ok()
    }
}

impl PartialEq for Wrapper {
    fn eq(&self, other: &Wrapper) -> bool {
        Value::Wrapper(self.clone()) == Value::Wrapper(other.clone())
    }
}

impl PartialEq<Value> for Wrapper {
    fn eq(&self, other: &Value) -> bool {
        Value::Wrapper(self.clone()) == *other
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::None => 0u8.hash(state),
            Value::Bool(b) => i64::from(*b).hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => {
                if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64 {
                    (*x as i64).hash(state)
                } else {
                    x.to_bits().hash(state)
                }
            }
            Value::Str(s) => s.hash(state),
            Value::List(list) => rc_addr(list).hash(state),
            Value::Object(obj) => match obj.hash_code() {
                Some(code) => code.hash(state),
                None => rc_addr(obj).hash(state),
            },
            Value::Wrapper(wrapper) => wrapper.wrapped().hash(state),
            Value::Method(_) | Value::Acquired(_) => self.identity().unwrap_or(0).hash(state),
        }
    }
}

impl Hash for Wrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wrapped().hash(state)
    }
}

macro_rules! forward_binary {
    ($($trait:ident, $method:ident, $op:expr);* $(;)?) => {
        $(
            impl std::ops::$trait<&Value> for &Wrapper {
                type Output = Result<Value>;

                fn $method(self, rhs: &Value) -> Result<Value> {
                    protocol::binary(&Value::Wrapper(self.clone()), $op, rhs)
                }
            }

            impl std::ops::$trait<Value> for &Wrapper {
                type Output = Result<Value>;

                fn $method(self, rhs: Value) -> Result<Value> {
                    protocol::binary(&Value::Wrapper(self.clone()), $op, &rhs)
                }
            }
        )*
    };
}

forward_binary! {
    Add, add, BinaryOp::Add;
    Sub, sub, BinaryOp::Sub;
    Mul, mul, BinaryOp::Mul;
    Div, div, BinaryOp::TrueDiv;
    Rem, rem, BinaryOp::Mod;
    BitAnd, bitand, BinaryOp::And;
    BitOr, bitor, BinaryOp::Or;
    BitXor, bitxor, BinaryOp::Xor;
    Shl, shl, BinaryOp::LShift;
    Shr, shr, BinaryOp::RShift;
}

impl std::ops::Neg for &Wrapper {
    type Output = Result<Value>;

    fn neg(self) -> Result<Value> {
        protocol::unary(&Value::Wrapper(self.clone()), UnaryOp::Neg)
    }
}

impl std::ops::Not for &Wrapper {
    type Output = Result<Value>;

    fn not(self) -> Result<Value> {
        protocol::unary(&Value::Wrapper(self.clone()), UnaryOp::Invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_operators_on_wrapper() {
        let w = Wrapper::implicit(Value::Int(12), Value::None);
        assert_eq!((&w + Value::Int(3)).unwrap(), Value::Int(15));
        assert_eq!((&w / &Value::Int(4)).unwrap(), Value::Float(3.0));
        assert_eq!((&w % Value::Int(5)).unwrap(), Value::Int(2));
        assert_eq!((&w << Value::Int(1)).unwrap(), Value::Int(24));
        assert_eq!((-&w).unwrap(), Value::Int(-12));
        assert_eq!((!&w).unwrap(), Value::Int(-13));
    }

    #[test]
    fn test_display_and_equality() {
        let w = Wrapper::implicit(Value::str("leaf"), Value::None);
        assert_eq!(w.to_string(), "leaf");
        assert_eq!(w, Value::str("leaf"));
        assert!(Value::Int(1) < Value::Float(1.5));
    }

    #[test]
    fn test_wrappers_hash_like_their_objects() {
        let mut seen = HashSet::new();
        seen.insert(Value::Int(3));
        let w = Value::Wrapper(Wrapper::implicit(Value::Int(3), Value::Int(4)));
        assert!(seen.contains(&w));
    }
}
