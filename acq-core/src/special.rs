//! Wrapper attributes answered before any delegation

use crate::api;
use crate::error::Result;
use crate::names::{is_serialization_probe, PARENT_ALIAS, SPECIAL_PREFIX};
use crate::resolve::Resolver;
use crate::value::Value;
use crate::wrapper::{Mode, Wrapper};

/// `aq_*` attributes of a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Special {
    Base,
    Parent,
    SelfRef,
    Explicit,
    Inner,
    Chain,
}

/// How a reserved name is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reserved {
    /// Answered by the wrapper and offered to the filter
    Special(Special),
    /// `__parent__`: the container, never filtered
    ParentAlias,
    /// State capture, always refused
    Probe,
}

impl Reserved {
    pub(crate) fn classify(name: &str) -> Option<Reserved> {
        if name == PARENT_ALIAS {
            return Some(Reserved::ParentAlias);
        }
        if is_serialization_probe(name) {
            return Some(Reserved::Probe);
        }
        let special = match name.strip_prefix(SPECIAL_PREFIX)? {
            "base" => Special::Base,
            "parent" => Special::Parent,
            "self" => Special::SelfRef,
            "explicit" => Special::Explicit,
            "inner" => Special::Inner,
            "chain" => Special::Chain,
            _ => return None,
        };
        Some(Reserved::Special(special))
    }
}

impl Special {
    pub(crate) fn evaluate(self, wrapper: &Wrapper, resolver: &Resolver) -> Result<Value> {
        let this = Value::Wrapper(wrapper.clone());
        Ok(match self {
            Special::Base => api::base(&this),
            Special::Parent => wrapper.container(),
            Special::SelfRef => wrapper.wrapped(),
            Special::Explicit => Value::Wrapper(wrapper.with_mode(Mode::Explicit)),
            Special::Inner => api::inner(&this),
            Special::Chain => Value::list(resolver.chain(&this, false)?),
        })
    }
}
