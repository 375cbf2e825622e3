//! The resolution engine
//!
//! `find` searches a wrapper's wrapped object (unwrapping nested wrappers
//! recursively) and falls back to `acquire`, which climbs to the container,
//! synthesizing a wrapper around plain containers that carry a parent
//! pointer. Every value handed back is bound into the context it was found
//! through.

use crate::context::propagate;
use crate::error::{AcqError, Result};
use crate::filter::Filter;
use crate::limits::Limits;
use crate::names::{is_private, PARENT_ALIAS, SPECIAL_PREFIX};
use crate::special::Reserved;
use crate::value::Value;
use crate::wrapper::{Mode, Wrapper};
use tracing::{debug, trace};

/// Which branches of a search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScope {
    /// Look at the wrapped object
    pub search_wrapped: bool,
    /// Fall back to the container
    pub search_container: bool,
    /// Acquire private names too
    pub explicit: bool,
    /// Start from the innermost wrapper
    pub containment: bool,
}

impl SearchScope {
    /// Plain attribute access on a wrapper in `mode`
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            search_wrapped: true,
            search_container: mode == Mode::Implicit,
            explicit: false,
            containment: false,
        }
    }

    /// Explicit acquisition, optionally restricted to containment
    pub fn acquiring(containment: bool) -> Self {
        Self {
            search_wrapped: true,
            search_container: true,
            explicit: true,
            containment,
        }
    }
}

/// Per-lookup arguments passed through to the filter
#[derive(Default)]
pub struct Lookup<'a> {
    filter: Option<&'a dyn Filter>,
    extra: Value,
    origin: Option<Value>,
}

impl<'a> Lookup<'a> {
    /// No filter, `extra` of `None`
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every candidate through `filter`
    pub fn with_filter(mut self, filter: &'a dyn Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Value handed to the filter as `extra`
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Value handed to the filter as `origin`; defaults to the searched wrapper
    pub fn with_origin(mut self, origin: Value) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Whether a filter is set
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }
}

/// Entry point for every resolution, carrying validated [`Limits`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    limits: Limits,
}

impl Resolver {
    /// Resolver with custom limits
    pub fn new(limits: Limits) -> Result<Self> {
        limits.validate()?;
        Ok(Self { limits })
    }

    /// Configured limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Search `wrapper` for `name` with explicit scope flags
    pub fn find_attribute(
        &self,
        wrapper: &Wrapper,
        name: &str,
        lookup: &Lookup<'_>,
        scope: SearchScope,
    ) -> Result<Value> {
        let search = Search {
            name,
            lookup,
            start: wrapper,
            limits: &self.limits,
            resolver: self,
        };
        search.find(wrapper, scope, 0)
    }

    /// Attribute access as the host runtime performs it.
    ///
    /// Wrappers search their container only in implicit mode. Plain objects
    /// return the native attribute bound into the object.
    pub fn getattr(&self, value: &Value, name: &str) -> Result<Value> {
        match value {
            Value::Wrapper(wrapper) => self.find_attribute(
                wrapper,
                name,
                &Lookup::new(),
                SearchScope::for_mode(wrapper.mode()),
            ),
            Value::Object(obj) if name == PARENT_ALIAS => obj.get_attr(name),
            Value::Object(_) => propagate(native_get(value, name)?, value),
            _ => Err(AcqError::not_found(name)),
        }
    }

    /// Assign an attribute.
    ///
    /// On a wrapper, `aq_parent`/`__parent__` replace the container and
    /// everything else is stored, unwrapped, on the innermost object.
    pub fn setattr(&self, target: &Value, name: &str, value: Value) -> Result<()> {
        match target {
            Value::Wrapper(wrapper) => {
                if is_parent_name(name) {
                    wrapper.set_container(value);
                    return Ok(());
                }
                let wrapped = wrapper.wrapped();
                if wrapped.is_none() {
                    return Err(AcqError::EmptyWrapper);
                }
                self.setattr(&wrapped, name, crate::api::base(&value))
            }
            Value::Object(obj) => obj.set_attr(name, value),
            other => Err(AcqError::unsupported(
                format!("setting attribute '{}'", name),
                other.type_name(),
            )),
        }
    }

    /// Delete an attribute; `aq_parent`/`__parent__` on a wrapper clears the container
    pub fn delattr(&self, target: &Value, name: &str) -> Result<()> {
        match target {
            Value::Wrapper(wrapper) => {
                if is_parent_name(name) {
                    wrapper.clear_container();
                    return Ok(());
                }
                let wrapped = wrapper.wrapped();
                if wrapped.is_none() {
                    return Err(AcqError::EmptyWrapper);
                }
                self.delattr(&wrapped, name)
            }
            Value::Object(obj) => obj.del_attr(name),
            other => Err(AcqError::unsupported(
                format!("deleting attribute '{}'", name),
                other.type_name(),
            )),
        }
    }
}

fn is_parent_name(name: &str) -> bool {
    name == PARENT_ALIAS || name.strip_prefix(SPECIAL_PREFIX) == Some("parent")
}

/// Native attribute get; unbound methods come back bound to `value`
pub(crate) fn native_get(value: &Value, name: &str) -> Result<Value> {
    match value {
        Value::Object(obj) => match obj.get_attr(name)? {
            Value::Method(method) if !method.is_bound() => {
                Ok(Value::Method(method.bind(value.clone())))
            }
            found => Ok(found),
        },
        _ => Err(AcqError::not_found(name)),
    }
}

/// Native parent pointer of a plain value
pub(crate) fn native_parent(value: &Value) -> Option<Value> {
    match value {
        Value::Object(obj) => obj.parent(),
        _ => None,
    }
}

/// The innermost nested wrapper of `wrapper`, when it wraps another wrapper
fn innermost_nested(wrapper: &Wrapper) -> Option<Wrapper> {
    let mut current = match wrapper.wrapped() {
        Value::Wrapper(inner) => inner,
        _ => return None,
    };
    while let Value::Wrapper(next) = current.wrapped() {
        current = next;
    }
    Some(current)
}

struct Search<'s, 'a> {
    name: &'s str,
    lookup: &'s Lookup<'a>,
    start: &'s Wrapper,
    limits: &'s Limits,
    resolver: &'s Resolver,
}

impl Search<'_, '_> {
    fn not_found(&self) -> AcqError {
        AcqError::not_found(self.name)
    }

    /// `depth` counts container hops and nested wrapper levels. Past the
    /// limit the graph is treated as cyclic.
    fn guard(&self, depth: usize) -> Result<()> {
        if depth > self.limits.max_depth {
            debug!(
                name = self.name,
                depth,
                max_depth = self.limits.max_depth,
                "resolution depth exceeded"
            );
            return Err(AcqError::recursion(self.name));
        }
        Ok(())
    }

    fn accept(&self, instance: &Value, value: &Value) -> Result<bool> {
        let Some(filter) = self.lookup.filter else {
            return Ok(true);
        };
        let origin = match &self.lookup.origin {
            Some(origin) => origin.clone(),
            None => Value::Wrapper(self.start.clone()),
        };
        let accepted = filter.accept(&origin, instance, self.name, value, &self.lookup.extra)?;
        if !accepted {
            trace!(name = self.name, instance = %instance.type_name(), "filter rejected candidate");
        }
        Ok(accepted)
    }

    /// Bind a value found on `wrapped` into `target`
    fn rebind(&self, value: Value, wrapped: &Value, target: &Wrapper) -> Result<Value> {
        match value {
            Value::Method(method) if method.receiver().map_or(false, |r| r.is(wrapped)) => {
                Ok(Value::Method(method.bind(Value::Wrapper(target.clone()))))
            }
            other => propagate(other, &Value::Wrapper(target.clone())),
        }
    }

    fn find(&self, wrapper: &Wrapper, scope: SearchScope, depth: usize) -> Result<Value> {
        self.guard(depth)?;

        if let Some(reserved) = Reserved::classify(self.name) {
            match reserved {
                Reserved::Probe => return Err(AcqError::NotSerializable),
                Reserved::ParentAlias => return Ok(wrapper.container()),
                Reserved::Special(special) => {
                    let value = special.evaluate(wrapper, self.resolver)?;
                    return if self.accept(&Value::Wrapper(wrapper.clone()), &value)? {
                        Ok(value)
                    } else {
                        Err(self.not_found())
                    };
                }
            }
        }

        let retargeted = if scope.containment {
            innermost_nested(wrapper)
        } else {
            None
        };
        let target = retargeted.as_ref().unwrap_or(wrapper);

        if scope.search_wrapped {
            let wrapped = target.wrapped();
            match &wrapped {
                Value::None => {}
                Value::Wrapper(inner) => {
                    if inner.ptr_eq(target) {
                        debug!(name = self.name, "wrapper wraps itself");
                        return Err(AcqError::recursion(self.name));
                    }
                    trace!(name = self.name, depth, "searching nested wrapper");
                    let inner_scope = SearchScope {
                        search_wrapped: true,
                        search_container: scope.explicit || inner.is_implicit(),
                        explicit: scope.explicit,
                        containment: scope.containment,
                    };
                    match self.find(inner, inner_scope, depth + 1) {
                        Ok(value) => return self.rebind(value, &wrapped, target),
                        Err(err) if err.is_not_found() => {}
                        Err(err) => return Err(err),
                    }
                }
                plain => {
                    if let Value::Wrapper(outer) = target.container() {
                        if let Value::Wrapper(back) = outer.container() {
                            if back.ptr_eq(target) {
                                debug!(name = self.name, "container loops back to wrapper");
                                return Err(AcqError::recursion(self.name));
                            }
                        }
                    }
                    trace!(name = self.name, depth, "searching wrapped object");
                    match native_get(plain, self.name) {
                        Ok(found) if found.is_acquired() => {
                            trace!(name = self.name, "marker forces acquisition");
                            return self.acquire(target, true, scope.containment, depth);
                        }
                        Ok(found) => {
                            let value = self.rebind(found, plain, target)?;
                            if self.accept(&Value::Wrapper(target.clone()), &value)? {
                                return Ok(value);
                            }
                        }
                        Err(err) if err.is_not_found() => {}
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        if scope.search_container && (!is_private(self.name) || scope.explicit) {
            return self.acquire(target, scope.explicit, scope.containment, depth);
        }
        Err(self.not_found())
    }

    /// Consult the container of `target`; every search it starts is one hop deeper
    fn acquire(&self, target: &Wrapper, explicit: bool, containment: bool, depth: usize) -> Result<Value> {
        let container = target.container();
        match &container {
            Value::None => Err(self.not_found()),
            Value::Wrapper(outer) => {
                let wrapped = target.wrapped();
                let mut scope = SearchScope {
                    search_wrapped: true,
                    search_container: true,
                    explicit,
                    containment,
                };
                if let Value::Wrapper(inner) = &wrapped {
                    let inner_container = inner.container();
                    if inner_container.is(&outer.container()) {
                        scope.search_container = false;
                    } else if inner_container.is(&outer.wrapped()) {
                        scope.search_wrapped = false;
                    }
                }
                if outer.container().is(&wrapped) {
                    scope.search_container = false;
                    scope.containment = true;
                }
                trace!(name = self.name, depth, ?scope, "acquiring from container");
                let value = self.find(outer, scope, depth + 1)?;
                propagate(value, &Value::Wrapper(target.clone()))
            }
            plain => match native_parent(plain) {
                Some(parent) => {
                    let wrapped = target.wrapped();
                    let loops_back = parent.is(&wrapped)
                        || matches!(&parent, Value::Wrapper(p) if p.wrapped().is(&wrapped));
                    let synthesized = Wrapper::new(plain.clone(), parent, Mode::Implicit);
                    let cached = target.cache_container(&synthesized);
                    trace!(name = self.name, depth, cached, loops_back, "wrapping container in its parent");
                    let scope = SearchScope {
                        search_wrapped: true,
                        search_container: !loops_back,
                        explicit,
                        containment,
                    };
                    self.find(&synthesized, scope, depth + 1)
                }
                None => {
                    trace!(name = self.name, depth, "searching end of chain");
                    let found = native_get(plain, self.name)?;
                    if found.is_acquired() || !self.accept(plain, &found)? {
                        return Err(self.not_found());
                    }
                    propagate(found, &Value::Wrapper(target.clone()))
                }
            },
        }
    }
}
