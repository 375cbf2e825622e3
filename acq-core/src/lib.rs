//! ACQ Core - Acquisition wrappers and context-dependent attribute resolution
//!
//! An object placed in a containment hierarchy can satisfy attribute lookups
//! from the objects that contain it. This crate provides the pieces with no
//! I/O dependencies:
//!
//! - The dynamic value model and the host object trait
//! - Capability traits for comparison, items, iteration and arithmetic
//! - Implicit and explicit acquisition wrappers
//! - The resolution engine (search, acquire, filters, cycle detection)
//! - Context propagation with wrapper collapsing
//! - Protocol forwarding through wrappers
//! - Convenience functions (`base`, `parent`, `inner`, `chain`, ...)
//! - Error types and resolution limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod capability;
pub mod context;
pub mod error;
pub mod filter;
pub mod instance;
pub mod limits;
pub mod marker;
pub mod method;
pub mod names;
mod numeric;
pub mod object;
mod ops;
pub mod protocol;
pub mod resolve;
mod special;
pub mod value;
pub mod wrapper;

// Re-export commonly used types
pub use api::{
    acquire, base, chain, delattr, get, getattr, in_context_of, inner, parent, self_of, setattr,
    AcquireOptions,
};
pub use capability::{
    BinaryOp, Comparable, Iterable, Mapping, NumericOps, Sequence, Textual, Truthy, UnaryOp,
    ValueIter,
};
pub use context::{of, propagate};
pub use error::{AcqError, Result};
pub use filter::{filter_fn, Filter};
pub use instance::{Class, Instance};
pub use limits::Limits;
pub use marker::{Acquired, ACQUIRED};
pub use method::Method;
pub use object::Object;
pub use resolve::{Lookup, Resolver, SearchScope};
pub use value::{ObjectRef, Value, WeakValue};
pub use wrapper::{Mode, WeakWrapper, Wrapper};
