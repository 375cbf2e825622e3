//! Capability traits forwarded through wrappers
//!
//! Each trait is a closed protocol a host object can opt into through the
//! probes on [`Object`](crate::object::Object). Every method receives `this`,
//! the value the operation was invoked on. When the object is reached through
//! a wrapper, `this` is that wrapper, so capability code can keep acquiring
//! from the context it was called in.

use crate::error::{AcqError, Result};
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;

/// Boxed iterator produced by the iteration protocol
pub type ValueIter = Box<dyn Iterator<Item = Result<Value>>>;

/// Ordering
pub trait Comparable {
    /// Compare `this` against `other`
    fn compare(&self, this: &Value, other: &Value) -> Result<Ordering>;
}

/// Indexed sequence
pub trait Sequence {
    /// Number of items
    fn len(&self, this: &Value) -> Result<usize>;

    /// Item at `index` exactly as the caller passed it, negative or not.
    /// Out of range yields [`AcqError::IndexOutOfRange`], which also ends iteration.
    fn get_item(&self, this: &Value, index: i64) -> Result<Value>;

    /// Store `value` at `index`
    fn set_item(&self, this: &Value, _index: i64, _value: Value) -> Result<()> {
        Err(AcqError::unsupported("item assignment", this.type_name()))
    }

    /// Remove the item at `index`
    fn del_item(&self, this: &Value, _index: i64) -> Result<()> {
        Err(AcqError::unsupported("item deletion", this.type_name()))
    }

    /// Items in `start..end` (already clamped)
    fn get_slice(&self, this: &Value, start: usize, end: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(end.saturating_sub(start));
        for index in start..end {
            items.push(self.get_item(this, index as i64)?);
        }
        Ok(Value::list(items))
    }

    /// Replace `start..end` with `items`
    fn set_slice(&self, this: &Value, _start: usize, _end: usize, _items: Vec<Value>) -> Result<()> {
        Err(AcqError::unsupported("slice assignment", this.type_name()))
    }

    /// Remove `start..end`
    fn del_slice(&self, this: &Value, _start: usize, _end: usize) -> Result<()> {
        Err(AcqError::unsupported("slice deletion", this.type_name()))
    }

    /// Membership test; scans items by equality unless overridden
    fn contains(&self, this: &Value, needle: &Value) -> Result<bool> {
        let len = self.len(this)?;
        for index in 0..len {
            let item = self.get_item(this, index as i64)?;
            if crate::protocol::equals(&item, needle)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Keyed mapping
pub trait Mapping {
    /// Number of entries
    fn len(&self, this: &Value) -> Result<usize>;

    /// Value stored under `key`, [`AcqError::KeyNotFound`] when absent
    fn get(&self, this: &Value, key: &Value) -> Result<Value>;

    /// Store `value` under `key`
    fn set(&self, this: &Value, _key: Value, _value: Value) -> Result<()> {
        Err(AcqError::unsupported("item assignment", this.type_name()))
    }

    /// Remove `key`
    fn remove(&self, this: &Value, _key: &Value) -> Result<()> {
        Err(AcqError::unsupported("item deletion", this.type_name()))
    }

    /// Whether `key` is present
    fn contains(&self, this: &Value, key: &Value) -> Result<bool> {
        match self.get(this, key) {
            Ok(_) => Ok(true),
            Err(AcqError::KeyNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// All keys, in the mapping's own order
    fn keys(&self, this: &Value) -> Result<Vec<Value>>;
}

/// Explicit iterator method
pub trait Iterable {
    /// Start a fresh iteration
    fn iter(&self, this: &Value) -> Result<ValueIter>;
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `@`
    MatMul,
    /// `/`
    TrueDiv,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// quotient and remainder
    DivMod,
    /// `**`
    Pow,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `&`
    And,
    /// `^`
    Xor,
    /// `|`
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::MatMul => "@",
            BinaryOp::TrueDiv => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::DivMod => "divmod",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::And => "&",
            BinaryOp::Xor => "^",
            BinaryOp::Or => "|",
        };
        f.write_str(symbol)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `abs(x)`
    Abs,
    /// `~x`
    Invert,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Neg => "unary -",
            UnaryOp::Pos => "unary +",
            UnaryOp::Abs => "abs()",
            UnaryOp::Invert => "unary ~",
        };
        f.write_str(symbol)
    }
}

/// Arithmetic and bitwise operators
pub trait NumericOps {
    /// `this <op> rhs`
    fn binary(&self, this: &Value, op: BinaryOp, rhs: &Value) -> Result<Value>;

    /// `lhs <op> this`, tried when the left operand does not handle `op`
    fn reflected(&self, this: &Value, op: BinaryOp, _lhs: &Value) -> Result<Value> {
        Err(AcqError::unsupported(format!("reflected {}", op), this.type_name()))
    }

    /// `this <op>= rhs`; defaults to the binary form
    fn in_place(&self, this: &Value, op: BinaryOp, rhs: &Value) -> Result<Value> {
        self.binary(this, op, rhs)
    }

    /// Unary operator
    fn unary(&self, this: &Value, op: UnaryOp) -> Result<Value> {
        Err(AcqError::unsupported(op.to_string(), this.type_name()))
    }

    /// Integer conversion
    fn to_int(&self, this: &Value) -> Result<i64> {
        Err(AcqError::unsupported("int()", this.type_name()))
    }

    /// Float conversion
    fn to_float(&self, this: &Value) -> Result<f64> {
        Err(AcqError::unsupported("float()", this.type_name()))
    }
}

/// String conversion
pub trait Textual {
    /// Human readable form
    fn str(&self, this: &Value) -> Result<String>;

    /// Debugging form; defaults to [`Textual::str`]
    fn repr(&self, this: &Value) -> Result<String> {
        self.str(this)
    }
}

/// Truth value
pub trait Truthy {
    /// Whether `this` counts as true
    fn truth(&self, this: &Value) -> Result<bool>;
}

/// Clamp optional slice bounds against `len`, counting negatives from the end.
pub fn clamp_range(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len_i = len as i64;
    let clamp = |bound: i64| -> usize {
        let bound = if bound < 0 { bound + len_i } else { bound };
        bound.clamp(0, len_i) as usize
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);
    (start, end.max(start))
}
