//! Protocol forwarding
//!
//! Generic operations over values. When the operand is a wrapper, the
//! capability is looked up on the fully unwrapped object and invoked with
//! the wrapper itself as `this`, so the implementation runs in the wrapper's
//! context. Without a capability the operation falls back to the native
//! behaviour of the unwrapped value.

use crate::api::base;
use crate::capability::{clamp_range, BinaryOp, UnaryOp, ValueIter};
use crate::error::{AcqError, Result};
use crate::marker::ACQUIRED;
use crate::numeric;
use crate::resolve::Resolver;
use crate::value::{ObjectRef, Value};
use crate::wrapper::Wrapper;
use ahash::RandomState;
use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash, Hasher};

fn object_of(x: &Value) -> Option<ObjectRef> {
    match base(x) {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

fn is_unsupported(result: &Result<Value>) -> bool {
    matches!(result, Err(AcqError::Unsupported { .. }))
}

fn index_of(x: &Value, key: &Value) -> Result<i64> {
    key.as_int().ok_or_else(|| {
        AcqError::unsupported(format!("indexing with {}", key.type_name()), x.type_name())
    })
}

fn normalize_index(index: i64, len: usize) -> Result<usize> {
    let len_i = len as i64;
    let adjusted = if index < 0 { index + len_i } else { index };
    if adjusted < 0 || adjusted >= len_i {
        return Err(AcqError::IndexOutOfRange { index });
    }
    Ok(adjusted as usize)
}

/// Total order over values
pub fn compare(x: &Value, other: &Value) -> Result<Ordering> {
    if x.is(other) {
        return Ok(Ordering::Equal);
    }
    if let Some(obj) = object_of(x) {
        if let Some(comparable) = obj.as_comparable() {
            return comparable.compare(x, other);
        }
    }
    if let Some(obj) = object_of(other) {
        if let Some(comparable) = obj.as_comparable() {
            return Ok(comparable.compare(other, x)?.reverse());
        }
    }
    native_compare(&base(x), &base(other))
}

fn native_compare(a: &Value, b: &Value) -> Result<Ordering> {
    if a.is(b) {
        return Ok(Ordering::Equal);
    }
    match (a, b) {
        (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            Ok(a.as_int().cmp(&b.as_int()))
        }
        (Value::Int(_) | Value::Bool(_) | Value::Float(_), Value::Int(_) | Value::Bool(_) | Value::Float(_)) => {
            let (x, y) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
            Ok(x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y)))
        }
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare(left, right)?;
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ => Ok(a
            .identity()
            .unwrap_or(0)
            .cmp(&b.identity().unwrap_or(0))
            .then_with(|| a.type_name().cmp(&b.type_name()))),
    }
}

/// Equality through [`compare`]
pub fn equals(x: &Value, other: &Value) -> Result<bool> {
    Ok(compare(x, other)? == Ordering::Equal)
}

/// Stable hash; a wrapper hashes as its wrapped value
pub fn hash_value(x: &Value) -> u64 {
    let state = RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    );
    let mut hasher = state.build_hasher();
    x.hash(&mut hasher);
    hasher.finish()
}

/// Truth value: `Truthy`, then non-zero length, then true
pub fn truthy(x: &Value) -> Result<bool> {
    if let Some(obj) = object_of(x) {
        if let Some(truthy) = obj.as_truthy() {
            return truthy.truth(x);
        }
        if let Some(mapping) = obj.as_mapping() {
            return Ok(mapping.len(x)? != 0);
        }
        if let Some(sequence) = obj.as_sequence() {
            return Ok(sequence.len(x)? != 0);
        }
        return Ok(true);
    }
    Ok(match base(x) {
        Value::None => false,
        Value::Bool(b) => b,
        Value::Int(i) => i != 0,
        Value::Float(f) => f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(items) => !items.borrow().is_empty(),
        _ => true,
    })
}

/// Human readable form
pub fn to_str(x: &Value) -> Result<String> {
    if let Some(obj) = object_of(x) {
        if let Some(textual) = obj.as_textual() {
            return textual.str(x);
        }
    }
    native_str(&base(x))
}

/// Debugging form
pub fn repr(x: &Value) -> Result<String> {
    if let Some(obj) = object_of(x) {
        if let Some(textual) = obj.as_textual() {
            return textual.repr(x);
        }
    }
    match base(x) {
        Value::Str(s) => Ok(format!("'{}'", s)),
        other => native_str(&other),
    }
}

pub(crate) fn native_str(x: &Value) -> Result<String> {
    Ok(match x {
        Value::None => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Str(s) => s.to_string(),
        Value::List(items) => {
            let items = items.borrow();
            let parts = items.iter().map(repr).collect::<Result<Vec<_>>>()?;
            format!("[{}]", parts.join(", "))
        }
        Value::Object(obj) => format!("<{} object>", obj.type_name()),
        Value::Wrapper(wrapper) => format!("<{}>", wrapper.type_name()),
        Value::Method(method) => format!("{:?}", method),
        Value::Acquired(_) => format!("{:?}", ACQUIRED),
    })
}

/// Number of items
pub fn len(x: &Value) -> Result<usize> {
    if let Some(obj) = object_of(x) {
        if let Some(mapping) = obj.as_mapping() {
            return mapping.len(x);
        }
        if let Some(sequence) = obj.as_sequence() {
            return sequence.len(x);
        }
        return Err(AcqError::unsupported("len()", x.type_name()));
    }
    match base(x) {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.borrow().len()),
        other => Err(AcqError::unsupported("len()", other.type_name())),
    }
}

/// `x[key]`
pub fn get_item(x: &Value, key: &Value) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(mapping) = obj.as_mapping() {
            return mapping.get(x, key);
        }
        if let Some(sequence) = obj.as_sequence() {
            return sequence.get_item(x, index_of(x, key)?);
        }
        return Err(AcqError::unsupported("item access", x.type_name()));
    }
    match base(x) {
        Value::List(items) => {
            let items = items.borrow();
            let index = normalize_index(index_of(x, key)?, items.len())?;
            Ok(items[index].clone())
        }
        Value::Str(s) => {
            let index = index_of(x, key)?;
            let position = normalize_index(index, s.chars().count())?;
            s.chars()
                .nth(position)
                .map(|c| Value::from(c.to_string()))
                .ok_or(AcqError::IndexOutOfRange { index })
        }
        other => Err(AcqError::unsupported("item access", other.type_name())),
    }
}

/// `x[key] = value`
pub fn set_item(x: &Value, key: &Value, value: Value) -> Result<()> {
    if let Some(obj) = object_of(x) {
        if let Some(mapping) = obj.as_mapping() {
            return mapping.set(x, key.clone(), value);
        }
        if let Some(sequence) = obj.as_sequence() {
            return sequence.set_item(x, index_of(x, key)?, value);
        }
        return Err(AcqError::unsupported("item assignment", x.type_name()));
    }
    match base(x) {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let index = normalize_index(index_of(x, key)?, items.len())?;
            items[index] = value;
            Ok(())
        }
        other => Err(AcqError::unsupported("item assignment", other.type_name())),
    }
}

/// `del x[key]`
pub fn del_item(x: &Value, key: &Value) -> Result<()> {
    if let Some(obj) = object_of(x) {
        if let Some(mapping) = obj.as_mapping() {
            return mapping.remove(x, key);
        }
        if let Some(sequence) = obj.as_sequence() {
            return sequence.del_item(x, index_of(x, key)?);
        }
        return Err(AcqError::unsupported("item deletion", x.type_name()));
    }
    match base(x) {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let index = normalize_index(index_of(x, key)?, items.len())?;
            items.remove(index);
            Ok(())
        }
        other => Err(AcqError::unsupported("item deletion", other.type_name())),
    }
}

/// `x[start:end]`
pub fn get_slice(x: &Value, start: Option<i64>, end: Option<i64>) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(sequence) = obj.as_sequence() {
            let (start, end) = clamp_range(start, end, sequence.len(x)?);
            return sequence.get_slice(x, start, end);
        }
        return Err(AcqError::unsupported("slicing", x.type_name()));
    }
    match base(x) {
        Value::List(items) => {
            let items = items.borrow();
            let (start, end) = clamp_range(start, end, items.len());
            Ok(Value::list(items[start..end].to_vec()))
        }
        Value::Str(s) => {
            let (start, end) = clamp_range(start, end, s.chars().count());
            Ok(Value::from(s.chars().skip(start).take(end - start).collect::<String>()))
        }
        other => Err(AcqError::unsupported("slicing", other.type_name())),
    }
}

/// `x[start:end] = items`
pub fn set_slice(x: &Value, start: Option<i64>, end: Option<i64>, items: Vec<Value>) -> Result<()> {
    if let Some(obj) = object_of(x) {
        if let Some(sequence) = obj.as_sequence() {
            let (start, end) = clamp_range(start, end, sequence.len(x)?);
            return sequence.set_slice(x, start, end, items);
        }
        return Err(AcqError::unsupported("slice assignment", x.type_name()));
    }
    match base(x) {
        Value::List(list) => {
            let mut list = list.borrow_mut();
            let (start, end) = clamp_range(start, end, list.len());
            list.splice(start..end, items);
            Ok(())
        }
        other => Err(AcqError::unsupported("slice assignment", other.type_name())),
    }
}

/// `del x[start:end]`
pub fn del_slice(x: &Value, start: Option<i64>, end: Option<i64>) -> Result<()> {
    if let Some(obj) = object_of(x) {
        if let Some(sequence) = obj.as_sequence() {
            let (start, end) = clamp_range(start, end, sequence.len(x)?);
            return sequence.del_slice(x, start, end);
        }
        return Err(AcqError::unsupported("slice deletion", x.type_name()));
    }
    match base(x) {
        Value::List(list) => {
            let mut list = list.borrow_mut();
            let (start, end) = clamp_range(start, end, list.len());
            list.drain(start..end);
            Ok(())
        }
        other => Err(AcqError::unsupported("slice deletion", other.type_name())),
    }
}

/// `needle in x`
pub fn contains(x: &Value, needle: &Value) -> Result<bool> {
    if let Some(obj) = object_of(x) {
        if let Some(mapping) = obj.as_mapping() {
            return mapping.contains(x, needle);
        }
        if let Some(sequence) = obj.as_sequence() {
            return sequence.contains(x, needle);
        }
        if obj.as_iterable().is_some() {
            for item in iter(x)? {
                if equals(&item?, needle)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        return Err(AcqError::unsupported("membership test", x.type_name()));
    }
    match base(x) {
        Value::List(items) => {
            let items = items.borrow().clone();
            for item in &items {
                if equals(item, needle)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Str(s) => match needle.as_str() {
            Some(part) => Ok(s.contains(part)),
            None => Err(AcqError::unsupported(
                format!("membership test for {}", needle.type_name()),
                "str",
            )),
        },
        other => Err(AcqError::unsupported("membership test", other.type_name())),
    }
}

/// Counting iterator calling item access through the original value.
///
/// Stops at the first `IndexOutOfRange`; any other error is yielded once
/// and ends the iteration.
pub struct SequenceIter {
    target: Value,
    index: i64,
    done: bool,
}

impl SequenceIter {
    /// Iterate `target[0]`, `target[1]`, ...
    pub fn new(target: Value) -> Self {
        Self {
            target,
            index: 0,
            done: false,
        }
    }
}

impl Iterator for SequenceIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match get_item(&self.target, &Value::Int(self.index)) {
            Ok(value) => {
                self.index += 1;
                Some(Ok(value))
            }
            Err(AcqError::IndexOutOfRange { .. }) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Start iterating `x`.
///
/// Sequences (by capability or natively) get a [`SequenceIter`] over `x`
/// itself, never over the wrapper's own iteration; then `Iterable`, then
/// mapping keys.
pub fn iter(x: &Value) -> Result<ValueIter> {
    match base(x) {
        Value::Object(obj) => {
            if obj.as_sequence().is_some() {
                return Ok(Box::new(SequenceIter::new(x.clone())));
            }
            if let Some(iterable) = obj.as_iterable() {
                return iterable.iter(x);
            }
            if let Some(mapping) = obj.as_mapping() {
                return Ok(Box::new(mapping.keys(x)?.into_iter().map(Ok)));
            }
            Err(AcqError::unsupported("iteration", x.type_name()))
        }
        Value::List(_) | Value::Str(_) => Ok(Box::new(SequenceIter::new(x.clone()))),
        other => Err(AcqError::unsupported("iteration", other.type_name())),
    }
}

/// `x <op> rhs`, trying the left operand, then the reflected right operand
pub fn binary(x: &Value, op: BinaryOp, rhs: &Value) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            let result = numeric.binary(x, op, rhs);
            if !is_unsupported(&result) {
                return result;
            }
        }
    }
    if let Some(obj) = object_of(rhs) {
        if let Some(numeric) = obj.as_numeric() {
            let result = numeric.reflected(rhs, op, x);
            if !is_unsupported(&result) {
                return result;
            }
        }
    }
    numeric::native_binary(&base(x), op, &base(rhs))
}

/// `lhs <op> x`, with `x` on the right
pub fn reflected(x: &Value, op: BinaryOp, lhs: &Value) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            let result = numeric.reflected(x, op, lhs);
            if !is_unsupported(&result) {
                return result;
            }
        }
    }
    numeric::native_binary(&base(lhs), op, &base(x))
}

/// `x <op>= rhs`; falls back to the binary form
pub fn in_place(x: &Value, op: BinaryOp, rhs: &Value) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            let result = numeric.in_place(x, op, rhs);
            if !is_unsupported(&result) {
                return result;
            }
        }
    }
    binary(x, op, rhs)
}

/// Unary operator
pub fn unary(x: &Value, op: UnaryOp) -> Result<Value> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            return numeric.unary(x, op);
        }
    }
    numeric::native_unary(&base(x), op)
}

/// Integer conversion
pub fn to_int(x: &Value) -> Result<i64> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            return numeric.to_int(x);
        }
    }
    numeric::native_to_int(&base(x))
}

/// Float conversion
pub fn to_float(x: &Value) -> Result<f64> {
    if let Some(obj) = object_of(x) {
        if let Some(numeric) = obj.as_numeric() {
            return numeric.to_float(x);
        }
    }
    numeric::native_to_float(&base(x))
}

impl Wrapper {
    fn as_value(&self) -> Value {
        Value::Wrapper(self.clone())
    }

    /// Attribute access with the wrapper's own search mode
    pub fn getattr(&self, name: &str) -> Result<Value> {
        Resolver::default().getattr(&self.as_value(), name)
    }

    /// Number of items of the wrapped object
    pub fn len(&self) -> Result<usize> {
        len(&self.as_value())
    }

    /// Whether the wrapped object has no items
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Iterate the wrapped object in this context
    pub fn try_iter(&self) -> Result<ValueIter> {
        iter(&self.as_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_fallbacks_see_through_wrappers() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let w = Value::Wrapper(Wrapper::implicit(list.clone(), Value::None));
        assert_eq!(len(&w).unwrap(), 3);
        assert_eq!(get_item(&w, &Value::Int(-1)).unwrap().as_int(), Some(3));
        assert!(matches!(
            get_item(&w, &Value::Int(3)),
            Err(AcqError::IndexOutOfRange { index: 3 })
        ));
        assert!(contains(&w, &Value::Int(2)).unwrap());
        assert!(truthy(&w).unwrap());
        let collected: Vec<i64> = iter(&w)
            .unwrap()
            .map(|v| v.unwrap().as_int().unwrap())
            .collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[test]
    fn test_native_slices() {
        let list = Value::list((0..5).map(Value::Int).collect());
        let slice = get_slice(&list, Some(1), Some(-1)).unwrap();
        assert_eq!(len(&slice).unwrap(), 3);
        set_slice(&list, Some(0), Some(2), vec![Value::Int(9)]).unwrap();
        assert_eq!(len(&list).unwrap(), 4);
        del_slice(&list, None, Some(1)).unwrap();
        assert_eq!(get_item(&list, &Value::Int(0)).unwrap().as_int(), Some(2));
        let text = Value::str("hello");
        assert_eq!(get_slice(&text, Some(1), Some(3)).unwrap().as_str(), Some("el"));
    }

    #[test]
    fn test_compare_falls_back_to_identity_and_value() {
        assert_eq!(compare(&Value::Int(1), &Value::Float(1.0)).unwrap(), Ordering::Equal);
        assert_eq!(compare(&Value::Int(1), &Value::Int(2)).unwrap(), Ordering::Less);
        assert_eq!(compare(&Value::str("b"), &Value::str("a")).unwrap(), Ordering::Greater);
        assert!(!equals(&Value::Int(1), &Value::str("1")).unwrap());
        let w = Value::Wrapper(Wrapper::implicit(Value::Int(5), Value::None));
        assert!(equals(&w, &Value::Int(5)).unwrap());
        assert_eq!(hash_value(&w), hash_value(&Value::Int(5)));
        assert_eq!(hash_value(&Value::Float(2.0)), hash_value(&Value::Int(2)));
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(to_str(&Value::Bool(true)).unwrap(), "True");
        assert_eq!(repr(&Value::str("a")).unwrap(), "'a'");
        let list = Value::list(vec![Value::str("a"), Value::Float(1.0), Value::None]);
        assert_eq!(to_str(&list).unwrap(), "['a', 1.0, None]");
    }

    #[test]
    fn test_arithmetic_through_wrapper() {
        let w = Value::Wrapper(Wrapper::implicit(Value::Int(6), Value::None));
        assert_eq!(binary(&w, BinaryOp::Mul, &Value::Int(7)).unwrap().as_int(), Some(42));
        assert_eq!(reflected(&w, BinaryOp::Sub, &Value::Int(10)).unwrap().as_int(), Some(4));
        assert_eq!(in_place(&w, BinaryOp::Add, &Value::Int(1)).unwrap().as_int(), Some(7));
        assert_eq!(unary(&w, UnaryOp::Neg).unwrap().as_int(), Some(-6));
        assert_eq!(to_float(&w).unwrap(), 6.0);
        assert!(binary(&w, BinaryOp::MatMul, &Value::Int(1)).is_err());
    }

    #[test]
    fn test_scalars_are_not_iterable() {
        assert!(matches!(iter(&Value::Int(1)), Err(AcqError::Unsupported { .. })));
        assert!(!truthy(&Value::Wrapper(Wrapper::implicit(Value::None, Value::None))).unwrap());
    }
}
