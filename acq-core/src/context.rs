//! Binding values into the context they were reached through

use crate::api::base;
use crate::error::Result;
use crate::value::Value;
use crate::wrapper::Wrapper;
use tracing::trace;

/// Bind `value` into `context`.
///
/// Objects that bind context are handed to their own binding hook. Wrappers
/// are re-bound around their innermost object and redundant layers are
/// spliced out. Everything else passes through unchanged.
pub fn propagate(value: Value, context: &Value) -> Result<Value> {
    match value {
        Value::Object(ref obj) if obj.binds_context() => obj.bind(obj, context),
        Value::Wrapper(wrapper) => rebind_wrapper(wrapper, context),
        other => Ok(other),
    }
}

/// Alias of [`propagate`] under the host's name for the operation
pub fn of(value: Value, context: &Value) -> Result<Value> {
    propagate(value, context)
}

fn binds_context(value: &Value) -> bool {
    matches!(base(value), Value::Object(obj) if obj.binds_context())
}

fn rebind_wrapper(wrapper: Wrapper, context: &Value) -> Result<Value> {
    if !binds_context(&Value::Wrapper(wrapper.clone())) {
        return Ok(Value::Wrapper(wrapper));
    }

    let fresh = match propagate(wrapper.wrapped(), context)? {
        Value::Wrapper(fresh) => fresh,
        other => return Ok(other),
    };
    let mut fresh = fresh.make_mut();
    fresh.replace_wrapped(Value::Wrapper(wrapper));

    let Value::Wrapper(outer) = fresh.container() else {
        return Ok(Value::Wrapper(fresh));
    };
    let context_object = outer.wrapped();
    loop {
        let Value::Wrapper(layer) = fresh.wrapped() else {
            break;
        };
        if !layer.container().is(&context_object) {
            break;
        }
        trace!(layer = layer.type_name(), "collapsing redundant wrapper layer");
        fresh = fresh.make_mut();
        fresh.replace_wrapped(layer.wrapped());
    }
    Ok(Value::Wrapper(fresh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Class, Instance};
    use crate::wrapper::Mode;
    use std::rc::Rc;

    #[test]
    fn test_plain_values_pass_through() {
        let ctx = Value::Int(0);
        assert_eq!(propagate(Value::Int(5), &ctx).unwrap().as_int(), Some(5));
        let plain: Value = Instance::new(&Rc::new(Class::new("Plain"))).into();
        assert!(propagate(plain.clone(), &ctx).unwrap().is(&plain));
    }

    #[test]
    fn test_acquirer_is_wrapped_in_its_mode() {
        let item: Value = Instance::new(&Rc::new(Class::explicit("Item"))).into();
        let ctx: Value = Instance::new(&Rc::new(Class::implicit("Folder"))).into();
        let bound = of(item.clone(), &ctx).unwrap();
        let wrapper = bound.as_wrapper().unwrap();
        assert_eq!(wrapper.mode(), Mode::Explicit);
        assert!(wrapper.wrapped().is(&item));
        assert!(wrapper.container().is(&ctx));
    }

    #[test]
    fn test_wrapper_over_non_binding_object_is_unchanged() {
        let w = Wrapper::implicit(Value::Int(1), Value::None);
        let out = propagate(Value::Wrapper(w.clone()), &Value::Int(2)).unwrap();
        assert!(out.as_wrapper().unwrap().ptr_eq(&w));
    }

    #[test]
    fn test_rebinding_keeps_existing_chain() {
        let class = Rc::new(Class::implicit("Folder"));
        let a: Value = Instance::new(&class).into();
        let b: Value = Instance::new(&class).into();
        let c: Value = Instance::new(&class).into();
        let ab = Wrapper::implicit(a.clone(), b);
        let out = propagate(Value::Wrapper(ab.clone()), &c).unwrap();
        let out = out.as_wrapper().unwrap();
        assert!(out.wrapped().as_wrapper().unwrap().ptr_eq(&ab));
        assert!(out.container().is(&c));
        assert!(base(&Value::Wrapper(out.clone())).is(&a));
    }

    #[test]
    fn test_redundant_layer_is_collapsed() {
        let class = Rc::new(Class::implicit("Folder"));
        let a: Value = Instance::new(&class).into();
        let b: Value = Instance::new(&class).into();
        let d: Value = Instance::new(&class).into();
        let context = Value::Wrapper(Wrapper::implicit(b.clone(), a));
        let stored = Wrapper::implicit(d.clone(), b);
        let out = propagate(Value::Wrapper(stored), &context).unwrap();
        let out = out.as_wrapper().unwrap();
        assert!(out.wrapped().is(&d));
        assert!(out.container().is(&context));
    }
}
