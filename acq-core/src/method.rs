//! Native methods with an optional bound receiver

use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// A native function, called with its receiver and arguments.
///
/// Methods stored on a class are unbound; reading one through an object
/// binds it to that object, and reading it through a wrapper binds it to
/// the wrapper so the body can acquire from the caller's context.
#[derive(Clone)]
pub struct Method {
    name: Rc<str>,
    func: Rc<MethodFn>,
    receiver: Option<Rc<Value>>,
}

impl Method {
    /// Create an unbound method
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
            receiver: None,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound receiver, if any
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// Whether the method carries a receiver
    pub fn is_bound(&self) -> bool {
        self.receiver.is_some()
    }

    /// Copy of this method bound to `receiver`
    pub fn bind(&self, receiver: Value) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func.clone(),
            receiver: Some(Rc::new(receiver)),
        }
    }

    /// Call with the bound receiver (`None` if unbound)
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let none = Value::None;
        let receiver = self.receiver.as_deref().unwrap_or(&none);
        (self.func)(receiver, args)
    }

    /// Whether both share the same underlying function
    pub fn same_function(&self, other: &Method) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }

    pub(crate) fn same(&self, other: &Method) -> bool {
        self.same_function(other)
            && match (&self.receiver, &other.receiver) {
                (None, None) => true,
                (Some(a), Some(b)) => a.is(b),
                _ => false,
            }
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.func) as *const () as usize
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.receiver {
            Some(receiver) => write!(
                f,
                "<bound method {} of {}>",
                self.name,
                receiver.type_name()
            ),
            None => write!(f, "<method {}>", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_method_sees_receiver() {
        let method = Method::new("echo", |receiver, args| {
            Ok(Value::list(
                std::iter::once(receiver.clone())
                    .chain(args.iter().cloned())
                    .collect(),
            ))
        });
        assert!(!method.is_bound());
        let bound = method.bind(Value::Int(7));
        assert!(bound.is_bound());
        assert!(bound.same_function(&method));
        let out = bound.call(&[Value::Int(8)]).unwrap();
        match out {
            Value::List(items) => {
                let items = items.borrow();
                assert_eq!(items[0].as_int(), Some(7));
                assert_eq!(items[1].as_int(), Some(8));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbound_call_receives_none() {
        let method = Method::new("who", |receiver, _| Ok(Value::Bool(receiver.is_none())));
        assert_eq!(method.call(&[]).unwrap().as_bool(), Some(true));
    }
}
