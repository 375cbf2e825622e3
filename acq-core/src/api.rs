//! Convenience functions over wrapped and plain values

use crate::error::{AcqError, Result};
use crate::filter::Filter;
use crate::resolve::{native_parent, Lookup, Resolver, SearchScope};
use crate::value::Value;
use crate::wrapper::Wrapper;
use ahash::AHashSet;
use tracing::debug;

/// Fully unwrap nested wrappers
pub fn base(x: &Value) -> Value {
    let mut current = x.clone();
    while let Value::Wrapper(wrapper) = current {
        current = wrapper.wrapped();
    }
    current
}

/// The wrapper's container, or the object's own parent pointer, or `None`
pub fn parent(x: &Value) -> Value {
    match x {
        Value::Wrapper(wrapper) => wrapper.container(),
        other => native_parent(other).unwrap_or_default(),
    }
}

/// One level of unwrapping; identity for plain values
pub fn self_of(x: &Value) -> Value {
    match x {
        Value::Wrapper(wrapper) => wrapper.wrapped(),
        other => other.clone(),
    }
}

/// The innermost wrapper, stopping before the first non-wrapper
pub fn inner(x: &Value) -> Value {
    let Value::Wrapper(wrapper) = x else {
        return x.clone();
    };
    let mut current = wrapper.clone();
    while let Value::Wrapper(next) = current.wrapped() {
        current = next;
    }
    Value::Wrapper(current)
}

/// Arguments of [`Resolver::acquire`]
pub struct AcquireOptions<'a> {
    filter: Option<&'a dyn Filter>,
    extra: Value,
    explicit: bool,
    default: Option<Value>,
    containment: bool,
}

impl Default for AcquireOptions<'_> {
    fn default() -> Self {
        Self {
            filter: None,
            extra: Value::None,
            explicit: true,
            default: None,
            containment: false,
        }
    }
}

impl<'a> AcquireOptions<'a> {
    /// Explicit search, no filter, no default
    pub fn new() -> Self {
        Self::default()
    }

    /// Run candidates through `filter`
    pub fn with_filter(mut self, filter: &'a dyn Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `extra` argument for the filter
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Acquire private names too (default: on)
    pub fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Value returned instead of `AttributeNotFound`
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict the search to the containment chain
    pub fn containment(mut self, containment: bool) -> Self {
        self.containment = containment;
        self
    }

    fn lookup(&self) -> Lookup<'a> {
        let lookup = Lookup::new().with_extra(self.extra.clone());
        match self.filter {
            Some(filter) => lookup.with_filter(filter),
            None => lookup,
        }
    }
}

fn substitute_default(result: Result<Value>, default: Option<&Value>) -> Result<Value> {
    match (result, default) {
        (Err(err), Some(default)) if err.is_not_found() => Ok(default.clone()),
        (result, _) => result,
    }
}

impl Resolver {
    /// Look `name` up on `x`, acquiring from its context.
    ///
    /// A plain object with a parent pointer (or any plain object when a
    /// filter is given) is wrapped in a temporary implicit wrapper first.
    /// The default only replaces `AttributeNotFound`.
    pub fn acquire(&self, x: &Value, name: &str, options: &AcquireOptions<'_>) -> Result<Value> {
        let lookup = options.lookup();
        let result = match x {
            Value::Wrapper(wrapper) => {
                let scope = SearchScope {
                    search_wrapped: true,
                    search_container: options.explicit || wrapper.is_implicit(),
                    explicit: options.explicit,
                    containment: options.containment,
                };
                self.find_attribute(wrapper, name, &lookup, scope)
            }
            other => {
                let context = match native_parent(other) {
                    Some(parent) => Some(parent),
                    None if options.filter.is_some() => Some(Value::None),
                    None => None,
                };
                match context {
                    Some(context) => {
                        let temporary = Wrapper::implicit(other.clone(), context);
                        let scope = SearchScope {
                            search_wrapped: true,
                            search_container: true,
                            explicit: options.explicit,
                            containment: options.containment,
                        };
                        self.find_attribute(&temporary, name, &lookup, scope)
                    }
                    None => self.getattr(other, name),
                }
            }
        };
        substitute_default(result, options.default.as_ref())
    }

    /// Explicit acquisition returning `default` when nothing is found
    pub fn get(&self, x: &Value, name: &str, default: Value, containment: bool) -> Result<Value> {
        let scope = SearchScope::acquiring(containment);
        let result = match x {
            Value::Wrapper(wrapper) => self.find_attribute(wrapper, name, &Lookup::new(), scope),
            other => match native_parent(other) {
                Some(parent) => {
                    let temporary = Wrapper::implicit(other.clone(), parent);
                    self.find_attribute(&temporary, name, &Lookup::new(), scope)
                }
                None => self.getattr(other, name),
            },
        };
        substitute_default(result, Some(&default))
    }

    /// Contexts of `x`, closest first.
    ///
    /// Wrappers contribute themselves (or their innermost wrapper under
    /// `containment`) and continue with their container; plain objects
    /// continue with their parent pointer.
    pub fn chain(&self, x: &Value, containment: bool) -> Result<Vec<Value>> {
        let mut contexts = Vec::new();
        let mut visited = AHashSet::new();
        let mut current = x.clone();
        loop {
            if contexts.len() >= self.limits().max_chain_length {
                return Err(AcqError::LimitExceeded(format!(
                    "chain longer than {} contexts",
                    self.limits().max_chain_length
                )));
            }
            if let Some(id) = current.identity() {
                if !visited.insert(id) {
                    debug!(contexts = contexts.len(), "context chain loops back");
                    return Err(AcqError::recursion("aq_chain"));
                }
            }
            match current {
                Value::Wrapper(wrapper) => {
                    let mut wrapper = wrapper;
                    if containment {
                        while let Value::Wrapper(next) = wrapper.wrapped() {
                            wrapper = next;
                        }
                    }
                    if !wrapper.wrapped().is_none() {
                        contexts.push(Value::Wrapper(wrapper.clone()));
                    }
                    current = wrapper.container();
                    if current.is_none() {
                        break;
                    }
                }
                plain => {
                    let next = native_parent(&plain);
                    contexts.push(plain);
                    match next {
                        Some(next) => current = next,
                        None => break,
                    }
                }
            }
        }
        Ok(contexts)
    }

    /// Whether `target` appears in the context chain of `x`.
    ///
    /// Compares fully unwrapped values by identity. With `search_inner`,
    /// each step first drops outer acquisition layers.
    pub fn in_context_of(&self, x: &Value, target: &Value, search_inner: bool) -> bool {
        let wanted = base(target);
        let mut visited = AHashSet::new();
        let mut next = x.clone();
        loop {
            if base(&next).is(&wanted) {
                return true;
            }
            let current = if search_inner { inner(&next) } else { next };
            if current.is_none() || visited.len() >= self.limits().max_chain_length {
                return false;
            }
            if let Some(id) = current.identity() {
                if !visited.insert(id) {
                    return false;
                }
            }
            next = parent(&current);
            if next.is_none() {
                return false;
            }
        }
    }
}

/// [`Resolver::chain`] with default limits
pub fn chain(x: &Value, containment: bool) -> Result<Vec<Value>> {
    Resolver::default().chain(x, containment)
}

/// [`Resolver::in_context_of`] with default limits
pub fn in_context_of(x: &Value, target: &Value, search_inner: bool) -> bool {
    Resolver::default().in_context_of(x, target, search_inner)
}

/// [`Resolver::acquire`] with default limits
pub fn acquire(x: &Value, name: &str, options: &AcquireOptions<'_>) -> Result<Value> {
    Resolver::default().acquire(x, name, options)
}

/// [`Resolver::get`] with default limits
pub fn get(x: &Value, name: &str, default: Value, containment: bool) -> Result<Value> {
    Resolver::default().get(x, name, default, containment)
}

/// [`Resolver::getattr`] with default limits
pub fn getattr(x: &Value, name: &str) -> Result<Value> {
    Resolver::default().getattr(x, name)
}

/// [`Resolver::setattr`] with default limits
pub fn setattr(x: &Value, name: &str, value: Value) -> Result<()> {
    Resolver::default().setattr(x, name, value)
}

/// [`Resolver::delattr`] with default limits
pub fn delattr(x: &Value, name: &str) -> Result<()> {
    Resolver::default().delattr(x, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Class, Instance};
    use crate::names::PARENT_ALIAS;
    use std::rc::Rc;

    fn node(class: &Rc<Class>) -> Value {
        Instance::new(class).into()
    }

    #[test]
    fn test_unwrapping_helpers() {
        let class = Rc::new(Class::implicit("Node"));
        let (leaf, mid, root) = (node(&class), node(&class), node(&class));
        let inner_w = Wrapper::implicit(leaf.clone(), mid.clone());
        let outer = Value::Wrapper(Wrapper::implicit(Value::Wrapper(inner_w.clone()), root));
        assert!(base(&outer).is(&leaf));
        assert!(inner(&outer).as_wrapper().unwrap().ptr_eq(&inner_w));
        assert!(self_of(&outer).as_wrapper().unwrap().ptr_eq(&inner_w));
        assert!(base(&leaf).is(&leaf));
        assert!(inner(&leaf).is(&leaf));
        assert!(self_of(&leaf).is(&leaf));
    }

    #[test]
    fn test_parent_of_plain_object_uses_pointer() {
        let class = Rc::new(Class::implicit("Node"));
        let (child, folder) = (node(&class), node(&class));
        assert!(parent(&child).is_none());
        child.as_object().unwrap().set_attr(PARENT_ALIAS, folder.clone()).unwrap();
        assert!(parent(&child).is(&folder));
    }

    #[test]
    fn test_chain_follows_parent_pointers() {
        let class = Rc::new(Class::implicit("Node"));
        let (a, b, c) = (node(&class), node(&class), node(&class));
        let set_parent = |child: &Value, parent: &Value| {
            child
                .as_object()
                .unwrap()
                .set_attr(PARENT_ALIAS, parent.clone())
                .unwrap()
        };
        set_parent(&a, &b);
        set_parent(&b, &c);
        let contexts = chain(&a, false).unwrap();
        assert_eq!(contexts.len(), 3);
        assert!(contexts[2].is(&c));

        set_parent(&c, &a);
        assert!(matches!(
            chain(&a, false),
            Err(AcqError::RecursionDetected { .. })
        ));
        assert!(!in_context_of(&a, &node(&class), true));
        assert!(in_context_of(&a, &c, true));
    }

    #[test]
    fn test_chain_limit() {
        let resolver = Resolver::new(crate::limits::Limits {
            max_chain_length: 2,
            ..Default::default()
        })
        .unwrap();
        let class = Rc::new(Class::implicit("Node"));
        let mut x = node(&class);
        for _ in 0..3 {
            x = Value::Wrapper(Wrapper::implicit(node(&class), x));
        }
        assert!(matches!(
            resolver.chain(&x, false),
            Err(AcqError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_get_on_plain_object_without_parent() {
        let class = Rc::new(Class::new("Plain").with_attr("k", 1));
        let plain = node(&class);
        assert_eq!(get(&plain, "k", Value::None, false).unwrap().as_int(), Some(1));
        assert_eq!(get(&plain, "missing", Value::Int(42), false).unwrap().as_int(), Some(42));
    }

    #[test]
    fn test_acquire_default_only_covers_not_found() {
        let class = Rc::new(Class::implicit("Node"));
        let w = Value::Wrapper(Wrapper::implicit(node(&class), node(&class)));
        let options = AcquireOptions::new().with_default(Value::Int(7));
        assert_eq!(acquire(&w, "missing", &options).unwrap().as_int(), Some(7));
        let err = acquire(&w, "__reduce__", &options).unwrap_err();
        assert_eq!(err, AcqError::NotSerializable);
    }
}
