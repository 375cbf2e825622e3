//! Dynamic values flowing through the resolution engine

use crate::marker::{Acquired, ACQUIRED};
use crate::method::Method;
use crate::object::Object;
use crate::wrapper::{WeakWrapper, Wrapper};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared handle to a host object
pub type ObjectRef = Rc<dyn Object>;

/// Shared, mutable list storage
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// A dynamic value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Immutable text
    Str(Rc<str>),
    /// Shared list
    List(ListRef),
    /// Host object
    Object(ObjectRef),
    /// Acquisition wrapper
    Wrapper(Wrapper),
    /// Native function, possibly bound to a receiver
    Method(Method),
    /// The force-acquisition marker
    Acquired(&'static Acquired),
}

pub(crate) fn rc_addr<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

impl Value {
    /// Wrap a host object into a value
    pub fn object<T: Object>(obj: T) -> Self {
        Value::Object(Rc::new(obj))
    }

    /// Build a text value
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    /// Build a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// The force-acquisition marker
    pub fn acquired() -> Self {
        Value::Acquired(&ACQUIRED)
    }

    /// Check for the force-acquisition marker
    pub fn is_acquired(&self) -> bool {
        matches!(self, Value::Acquired(marker) if Acquired::is_marker(marker))
    }

    /// Check for `None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Check for a wrapper
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Value::Wrapper(_))
    }

    /// Borrow as a wrapper
    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        match self {
            Value::Wrapper(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    /// Borrow as a host object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float payload (integers widen), if any
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Text payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Method payload, if any
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Name of the value's type
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(obj) => obj.type_name().to_string(),
            Value::Wrapper(wrapper) => wrapper.type_name().to_string(),
            Value::Method(_) => "method".to_string(),
            Value::Acquired(_) => "Acquired".to_string(),
        }
    }

    /// Identity comparison.
    ///
    /// Handles (objects, wrappers, lists, methods) compare by address,
    /// scalars by value.
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => rc_addr(a) == rc_addr(b),
            (Value::Wrapper(a), Value::Wrapper(b)) => a.ptr_eq(b),
            (Value::Method(a), Value::Method(b)) => a.same(b),
            (Value::Acquired(a), Value::Acquired(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// Address of the underlying handle; `None` for scalars
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(list) => Some(rc_addr(list)),
            Value::Object(obj) => Some(rc_addr(obj)),
            Value::Wrapper(wrapper) => Some(wrapper.addr()),
            Value::Method(method) => Some(method.addr()),
            Value::Acquired(marker) => Some(*marker as *const Acquired as usize),
            _ => None,
        }
    }

    /// Non-owning handle to this value
    pub fn downgrade(&self) -> WeakValue {
        match self {
            Value::Object(obj) => WeakValue::Object(Rc::downgrade(obj)),
            Value::Wrapper(wrapper) => WeakValue::Wrapper(wrapper.downgrade()),
            Value::List(list) => WeakValue::List(Rc::downgrade(list)),
            other => WeakValue::Strong(other.clone()),
        }
    }
}

/// Non-owning counterpart of [`Value`], used for parent back-references.
///
/// Scalars have no identity to lose and are held strongly.
#[derive(Clone)]
pub enum WeakValue {
    /// Weak host object
    Object(Weak<dyn Object>),
    /// Weak wrapper
    Wrapper(WeakWrapper),
    /// Weak list
    List(Weak<RefCell<Vec<Value>>>),
    /// Scalar held by value
    Strong(Value),
}

impl WeakValue {
    /// Recover the value if it is still alive
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            WeakValue::Object(obj) => obj.upgrade().map(Value::Object),
            WeakValue::Wrapper(wrapper) => wrapper.upgrade().map(Value::Wrapper),
            WeakValue::List(list) => list.upgrade().map(Value::List),
            WeakValue::Strong(value) => Some(value.clone()),
        }
    }
}

impl fmt::Debug for WeakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(value) => write!(f, "Weak({:?})", value),
            None => f.write_str("Weak(<dropped>)"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(list) => match list.try_borrow() {
                Ok(items) => f.debug_list().entries(items.iter()).finish(),
                Err(_) => f.write_str("[<borrowed>]"),
            },
            Value::Object(obj) => write!(f, "<{} object at {:#x}>", obj.type_name(), rc_addr(obj)),
            Value::Wrapper(wrapper) => fmt::Debug::fmt(wrapper, f),
            Value::Method(method) => fmt::Debug::fmt(method, f),
            Value::Acquired(marker) => fmt::Debug::fmt(marker, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<Wrapper> for Value {
    fn from(wrapper: Wrapper) -> Self {
        Value::Wrapper(wrapper)
    }
}

impl From<Method> for Value {
    fn from(method: Method) -> Self {
        Value::Method(method)
    }
}

impl<T: Object> From<Rc<T>> for Value {
    fn from(obj: Rc<T>) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Class, Instance};

    #[test]
    fn test_identity_of_scalars_is_by_value() {
        assert!(Value::from(3).is(&Value::Int(3)));
        assert!(Value::from("a").is(&Value::str("a")));
        assert!(Value::None.is(&Value::None));
        assert!(!Value::from(3).is(&Value::from(3.0)));
    }

    #[test]
    fn test_identity_of_handles_is_by_address() {
        let class = Rc::new(Class::implicit("Item"));
        let a: Value = Instance::new(&class).into();
        let b: Value = Instance::new(&class).into();
        assert!(a.is(&a.clone()));
        assert!(!a.is(&b));
        assert_eq!(a.identity(), a.clone().identity());
        assert_ne!(a.identity(), b.identity());
        assert_eq!(Value::Int(1).identity(), None);
    }

    #[test]
    fn test_marker_is_only_marker() {
        assert!(Value::acquired().is_acquired());
        assert!(Value::acquired().is(&Value::acquired()));
        assert!(!Value::str("<Special Object Used to Force Acquisition>").is_acquired());
    }

    #[test]
    fn test_weak_value_does_not_keep_object_alive() {
        let class = Rc::new(Class::implicit("Item"));
        let strong: Value = Instance::new(&class).into();
        let weak = strong.downgrade();
        assert!(weak.upgrade().is_some());
        drop(strong);
        assert!(weak.upgrade().is_none());
        assert!(Value::Int(7).downgrade().upgrade().is_some());
    }
}
