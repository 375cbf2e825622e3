//! Sample host objects exercising the capability traits

use acq_core::{
    protocol, AcqError, BinaryOp, Comparable, Filter, Iterable, Mapping, Mode, NumericOps, Object,
    ObjectRef, Result, Sequence, Textual, Truthy, UnaryOp, Value, ValueIter,
};
use std::cell::RefCell;
use std::cmp::Ordering;

/// An implicitly acquiring integer box with arithmetic and ordering
#[derive(Debug, Clone, Copy)]
pub struct NumberBox(pub i64);

impl NumberBox {
    /// Box `n` as a value
    pub fn value(n: i64) -> Value {
        Value::object(NumberBox(n))
    }
}

impl Object for NumberBox {
    fn type_name(&self) -> &str {
        "NumberBox"
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        match name {
            "value" => Ok(Value::Int(self.0)),
            _ => Err(AcqError::not_found(name)),
        }
    }

    fn acquisition_mode(&self) -> Option<Mode> {
        Some(Mode::Implicit)
    }

    fn hash_code(&self) -> Option<u64> {
        Some(self.0 as u64)
    }

    fn as_comparable(&self) -> Option<&dyn Comparable> {
        Some(self)
    }

    fn as_numeric(&self) -> Option<&dyn NumericOps> {
        Some(self)
    }

    fn as_textual(&self) -> Option<&dyn Textual> {
        Some(self)
    }

    fn as_truthy(&self) -> Option<&dyn Truthy> {
        Some(self)
    }
}

impl Comparable for NumberBox {
    fn compare(&self, _this: &Value, other: &Value) -> Result<Ordering> {
        Ok(self.0.cmp(&protocol::to_int(other)?))
    }
}

impl NumericOps for NumberBox {
    fn binary(&self, _this: &Value, op: BinaryOp, rhs: &Value) -> Result<Value> {
        let rhs = protocol::to_int(rhs)?;
        protocol::binary(&Value::Int(self.0), op, &Value::Int(rhs))
    }

    fn reflected(&self, _this: &Value, op: BinaryOp, lhs: &Value) -> Result<Value> {
        let lhs = protocol::to_int(lhs)?;
        protocol::binary(&Value::Int(lhs), op, &Value::Int(self.0))
    }

    fn unary(&self, _this: &Value, op: UnaryOp) -> Result<Value> {
        protocol::unary(&Value::Int(self.0), op)
    }

    fn to_int(&self, _this: &Value) -> Result<i64> {
        Ok(self.0)
    }

    fn to_float(&self, _this: &Value) -> Result<f64> {
        Ok(self.0 as f64)
    }
}

impl Textual for NumberBox {
    fn str(&self, _this: &Value) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn repr(&self, _this: &Value) -> Result<String> {
        Ok(format!("NumberBox({})", self.0))
    }
}

impl Truthy for NumberBox {
    fn truth(&self, _this: &Value) -> Result<bool> {
        Ok(self.0 != 0)
    }
}

/// A sequence whose items report the `label` acquired from the receiver.
///
/// Item `i` is `"i:<label>"`, or `"i:-"` when no label is reachable.
#[derive(Debug)]
pub struct LabelSequence {
    len: usize,
}

impl LabelSequence {
    /// A sequence of `len` items
    pub fn value(len: usize) -> Value {
        Value::object(LabelSequence { len })
    }
}

impl Object for LabelSequence {
    fn type_name(&self) -> &str {
        "LabelSequence"
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        Err(AcqError::not_found(name))
    }

    fn acquisition_mode(&self) -> Option<Mode> {
        Some(Mode::Implicit)
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        Some(self)
    }
}

impl Sequence for LabelSequence {
    fn len(&self, _this: &Value) -> Result<usize> {
        Ok(self.len)
    }

    fn get_item(&self, this: &Value, index: i64) -> Result<Value> {
        let normalized = if index < 0 { index + self.len as i64 } else { index };
        if normalized < 0 || normalized >= self.len as i64 {
            return Err(AcqError::IndexOutOfRange { index });
        }
        let label = match acq_core::getattr(this, "label") {
            Ok(label) => label.to_string(),
            Err(err) if err.is_not_found() => "-".to_string(),
            Err(err) => return Err(err),
        };
        Ok(Value::from(format!("{}:{}", normalized, label)))
    }
}

/// An ordered mapping keyed by value equality
#[derive(Debug, Default)]
pub struct Registry {
    entries: RefCell<Vec<(Value, Value)>>,
}

impl Registry {
    /// A registry holding `entries`
    pub fn value(entries: Vec<(Value, Value)>) -> Value {
        Value::object(Registry {
            entries: RefCell::new(entries),
        })
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.borrow().iter().position(|(k, _)| k == key)
    }
}

impl Object for Registry {
    fn type_name(&self) -> &str {
        "Registry"
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        Err(AcqError::not_found(name))
    }

    fn as_mapping(&self) -> Option<&dyn Mapping> {
        Some(self)
    }
}

impl Mapping for Registry {
    fn len(&self, _this: &Value) -> Result<usize> {
        Ok(self.entries.borrow().len())
    }

    fn get(&self, _this: &Value, key: &Value) -> Result<Value> {
        match self.position(key) {
            Some(i) => Ok(self.entries.borrow()[i].1.clone()),
            None => Err(AcqError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    fn set(&self, _this: &Value, key: Value, value: Value) -> Result<()> {
        match self.position(&key) {
            Some(i) => self.entries.borrow_mut()[i].1 = value,
            None => self.entries.borrow_mut().push((key, value)),
        }
        Ok(())
    }

    fn remove(&self, _this: &Value, key: &Value) -> Result<()> {
        match self.position(key) {
            Some(i) => {
                self.entries.borrow_mut().remove(i);
                Ok(())
            }
            None => Err(AcqError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    fn keys(&self, _this: &Value) -> Result<Vec<Value>> {
        Ok(self.entries.borrow().iter().map(|(k, _)| k.clone()).collect())
    }
}

/// Iterates `n - 1` down to `0`
#[derive(Debug, Clone, Copy)]
pub struct Countdown(pub i64);

impl Object for Countdown {
    fn type_name(&self) -> &str {
        "Countdown"
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        Err(AcqError::not_found(name))
    }

    fn as_iterable(&self) -> Option<&dyn Iterable> {
        Some(self)
    }
}

impl Iterable for Countdown {
    fn iter(&self, _this: &Value) -> Result<ValueIter> {
        Ok(Box::new((0..self.0).rev().map(|i| Ok(Value::Int(i)))))
    }
}

/// An object whose context binding replaces it with `42`
#[derive(Debug, Clone, Copy)]
pub struct FortyTwo;

impl Object for FortyTwo {
    fn type_name(&self) -> &str {
        "FortyTwo"
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        Err(AcqError::not_found(name))
    }

    fn binds_context(&self) -> bool {
        true
    }

    fn bind(&self, _this: &ObjectRef, _context: &Value) -> Result<Value> {
        Ok(Value::Int(42))
    }
}

/// Filter recording every call and accepting by predicate
pub struct RecordingFilter<P> {
    accept: P,
    calls: RefCell<Vec<FilterCall>>,
}

/// One recorded filter invocation
#[derive(Debug, Clone)]
pub struct FilterCall {
    /// Start of the lookup
    pub origin: Value,
    /// Object the candidate was found on
    pub instance: Value,
    /// Requested name
    pub name: String,
    /// Candidate value
    pub value: Value,
    /// Caller-supplied extra argument
    pub extra: Value,
}

impl<P> RecordingFilter<P>
where
    P: Fn(&Value) -> bool,
{
    /// Accept candidates for which `accept(value)` holds
    pub fn new(accept: P) -> Self {
        Self {
            accept,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Calls seen so far
    pub fn calls(&self) -> Vec<FilterCall> {
        self.calls.borrow().clone()
    }
}

impl<P> Filter for RecordingFilter<P>
where
    P: Fn(&Value) -> bool,
{
    fn accept(
        &self,
        origin: &Value,
        instance: &Value,
        name: &str,
        value: &Value,
        extra: &Value,
    ) -> Result<bool> {
        self.calls.borrow_mut().push(FilterCall {
            origin: origin.clone(),
            instance: instance.clone(),
            name: name.to_string(),
            value: value.clone(),
            extra: extra.clone(),
        });
        Ok((self.accept)(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_box_arithmetic() {
        let five = NumberBox::value(5);
        assert_eq!(
            protocol::binary(&five, BinaryOp::Add, &Value::Int(2)).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            protocol::binary(&Value::Int(2), BinaryOp::Sub, &five).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(protocol::repr(&five).unwrap(), "NumberBox(5)");
    }

    #[test]
    fn test_label_sequence_without_context() {
        let seq = LabelSequence::value(2);
        assert_eq!(
            protocol::get_item(&seq, &Value::Int(-1)).unwrap().as_str(),
            Some("1:-")
        );
    }

    #[test]
    fn test_registry_roundtrip() {
        let reg = Registry::value(vec![(Value::str("a"), Value::Int(1))]);
        protocol::set_item(&reg, &Value::str("b"), Value::Int(2)).unwrap();
        assert_eq!(protocol::len(&reg).unwrap(), 2);
        protocol::del_item(&reg, &Value::str("a")).unwrap();
        assert!(matches!(
            protocol::get_item(&reg, &Value::str("a")),
            Err(AcqError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_countdown_iterates() {
        let items: Vec<i64> = protocol::iter(&Value::object(Countdown(3)))
            .unwrap()
            .map(|v| v.unwrap().as_int().unwrap())
            .collect();
        assert_eq!(items, vec![2, 1, 0]);
    }
}
