//! Ready-made dynamic objects: classes with shared attributes and instances
//! with their own attribute maps and a weak parent pointer.

use crate::error::{AcqError, Result};
use crate::method::Method;
use crate::names::PARENT_ALIAS;
use crate::object::Object;
use crate::value::{Value, WeakValue};
use crate::wrapper::Mode;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared attributes and the acquirer tag for a family of instances
#[derive(Debug)]
pub struct Class {
    name: String,
    mode: Option<Mode>,
    attrs: AHashMap<String, Value>,
}

impl Class {
    /// A class whose instances do not acquire
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: None,
            attrs: AHashMap::new(),
        }
    }

    /// A class whose instances are wrapped implicitly
    pub fn implicit(name: impl Into<String>) -> Self {
        Self {
            mode: Some(Mode::Implicit),
            ..Self::new(name)
        }
    }

    /// A class whose instances are wrapped explicitly
    pub fn explicit(name: impl Into<String>) -> Self {
        Self {
            mode: Some(Mode::Explicit),
            ..Self::new(name)
        }
    }

    /// Add a shared attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Add a method
    pub fn with_method<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        self.attrs
            .insert(name.to_string(), Value::Method(Method::new(name, func)));
        self
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquirer tag
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Shared attribute lookup
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}

/// An object with its own attributes, backed by a [`Class`]
pub struct Instance {
    class: Rc<Class>,
    attrs: RefCell<AHashMap<String, Value>>,
    parent: RefCell<Option<WeakValue>>,
}

impl Instance {
    /// Create an instance of `class`
    pub fn new(class: &Rc<Class>) -> Rc<Self> {
        Rc::new(Self {
            class: class.clone(),
            attrs: RefCell::new(AHashMap::new()),
            parent: RefCell::new(None),
        })
    }

    /// The instance's class
    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Store an attribute. `__parent__` sets the parent pointer.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if name == PARENT_ALIAS {
            self.set_parent(&value);
        } else {
            self.attrs.borrow_mut().insert(name.to_string(), value);
        }
    }

    /// Own attribute, without consulting the class
    pub fn own_attr(&self, name: &str) -> Option<Value> {
        self.attrs.borrow().get(name).cloned()
    }

    /// Own attribute names, sorted
    pub fn attr_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attrs.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Point the parent at `parent`; `None` clears it.
    ///
    /// Objects and lists are referenced weakly. A wrapper is held strongly:
    /// it is usually the only handle on the context it carries.
    pub fn set_parent(&self, parent: &Value) {
        *self.parent.borrow_mut() = match parent {
            Value::None => None,
            Value::Wrapper(_) => Some(WeakValue::Strong(parent.clone())),
            other => Some(other.downgrade()),
        };
    }

    /// Drop the parent pointer
    pub fn clear_parent(&self) {
        self.parent.borrow_mut().take();
    }

    fn parent_value(&self) -> Option<Value> {
        self.parent.borrow().as_ref().and_then(WeakValue::upgrade)
    }
}

impl Object for Instance {
    fn type_name(&self) -> &str {
        self.class.name()
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.attrs.borrow().get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.class.attr(name) {
            return Ok(value.clone());
        }
        if name == PARENT_ALIAS {
            if let Some(parent) = self.parent_value() {
                return Ok(parent);
            }
        }
        Err(AcqError::not_found(name))
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        self.set(name, value);
        Ok(())
    }

    fn del_attr(&self, name: &str) -> Result<()> {
        if name == PARENT_ALIAS {
            return match self.parent.borrow_mut().take() {
                Some(_) => Ok(()),
                None => Err(AcqError::not_found(name)),
            };
        }
        match self.attrs.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(AcqError::not_found(name)),
        }
    }

    fn parent(&self) -> Option<Value> {
        self.parent_value()
    }

    fn acquisition_mode(&self) -> Option<Mode> {
        self.class.mode()
    }

    fn state(&self) -> Option<Vec<(String, Value)>> {
        let attrs = self.attrs.borrow();
        let mut state: Vec<(String, Value)> = attrs
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        state.sort_by(|a, b| a.0.cmp(&b.0));
        Some(state)
    }
}
