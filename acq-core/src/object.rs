//! The host object trait
//!
//! Anything that can sit in a containment hierarchy implements [`Object`].
//! The engine only ever uses the native primitives declared here: attribute
//! get/set/delete, an optional parent pointer, the acquirer tag and the
//! context-binding hook. Protocol behaviour (comparison, items, arithmetic
//! and so on) is exposed through the capability probes.

use crate::capability::{Comparable, Iterable, Mapping, NumericOps, Sequence, Textual, Truthy};
use crate::error::{AcqError, Result};
use crate::names::PARENT_ALIAS;
use crate::value::{ObjectRef, Value};
use crate::wrapper::{Mode, Wrapper};

/// A native object participating in attribute resolution
pub trait Object: 'static {
    /// Name of the object's type
    fn type_name(&self) -> &str;

    /// Native attribute lookup.
    ///
    /// Must return [`AcqError::AttributeNotFound`] when the attribute is
    /// absent; any other error aborts the surrounding search.
    fn get_attr(&self, name: &str) -> Result<Value>;

    /// Native attribute assignment
    fn set_attr(&self, name: &str, _value: Value) -> Result<()> {
        Err(AcqError::unsupported(
            format!("setting attribute '{}'", name),
            self.type_name(),
        ))
    }

    /// Native attribute deletion
    fn del_attr(&self, name: &str) -> Result<()> {
        Err(AcqError::unsupported(
            format!("deleting attribute '{}'", name),
            self.type_name(),
        ))
    }

    /// The object's own parent pointer, if it carries one
    fn parent(&self) -> Option<Value> {
        self.get_attr(PARENT_ALIAS).ok().filter(|v| !v.is_none())
    }

    /// Acquirer tag: `Some` when instances are wrapped when fetched from a context
    fn acquisition_mode(&self) -> Option<Mode> {
        None
    }

    /// Whether [`Object::bind`] does anything
    fn binds_context(&self) -> bool {
        self.acquisition_mode().is_some()
    }

    /// Bind `this` into `context`. The default wraps it in the tagged mode.
    fn bind(&self, this: &ObjectRef, context: &Value) -> Result<Value> {
        match self.acquisition_mode() {
            Some(mode) => Ok(Value::Wrapper(Wrapper::new(
                Value::Object(this.clone()),
                context.clone(),
                mode,
            ))),
            None => Ok(Value::Object(this.clone())),
        }
    }

    /// Native hash; `None` hashes by address
    fn hash_code(&self) -> Option<u64> {
        None
    }

    /// Persistable attributes, `None` when the object has no capturable state
    fn state(&self) -> Option<Vec<(String, Value)>> {
        None
    }

    /// Ordering capability
    fn as_comparable(&self) -> Option<&dyn Comparable> {
        None
    }

    /// Indexed sequence capability
    fn as_sequence(&self) -> Option<&dyn Sequence> {
        None
    }

    /// Keyed mapping capability
    fn as_mapping(&self) -> Option<&dyn Mapping> {
        None
    }

    /// Explicit iterator capability
    fn as_iterable(&self) -> Option<&dyn Iterable> {
        None
    }

    /// Arithmetic capability
    fn as_numeric(&self) -> Option<&dyn NumericOps> {
        None
    }

    /// String conversion capability
    fn as_textual(&self) -> Option<&dyn Textual> {
        None
    }

    /// Truthiness capability
    fn as_truthy(&self) -> Option<&dyn Truthy> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Plain;

    impl Object for Plain {
        fn type_name(&self) -> &str {
            "Plain"
        }

        fn get_attr(&self, name: &str) -> Result<Value> {
            match name {
                "x" => Ok(Value::Int(1)),
                _ => Err(AcqError::not_found(name)),
            }
        }
    }

    struct Tagged;

    impl Object for Tagged {
        fn type_name(&self) -> &str {
            "Tagged"
        }

        fn get_attr(&self, name: &str) -> Result<Value> {
            Err(AcqError::not_found(name))
        }

        fn acquisition_mode(&self) -> Option<Mode> {
            Some(Mode::Explicit)
        }
    }

    #[test]
    fn test_defaults_for_plain_object() {
        let obj: ObjectRef = Rc::new(Plain);
        assert!(!obj.binds_context());
        assert!(obj.parent().is_none());
        assert!(obj.set_attr("x", Value::Int(2)).is_err());
        let bound = obj.bind(&obj, &Value::Int(0)).unwrap();
        assert!(bound.is(&Value::Object(obj.clone())));
    }

    #[test]
    fn test_default_bind_wraps_in_tagged_mode() {
        let obj: ObjectRef = Rc::new(Tagged);
        let bound = obj.bind(&obj, &Value::str("ctx")).unwrap();
        let wrapper = bound.as_wrapper().unwrap();
        assert_eq!(wrapper.mode(), Mode::Explicit);
        assert!(wrapper.container().is(&Value::str("ctx")));
    }
}
