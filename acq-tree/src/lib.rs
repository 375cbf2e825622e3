//! ACQ Tree - Containment trees over the acquisition engine
//!
//! This crate turns JSON and TOML documents into trees of acquiring
//! instances:
//!
//! - Loading (`@type`, `@mode` and `@acquire` directives, weak parent pointers)
//! - Path traversal that binds every step into its context
//! - State capture that refuses wrappers
//! - Chain reports for display

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod path;
pub mod report;
pub mod state;

// Re-export commonly used types
pub use acq_core::{AcqError, Limits, Resolver, Value};
pub use error::{Result, TreeError};
pub use loader::{
    load_json, load_json_str, load_path, load_toml_str, scalar_from_json, Tree, TreeFormat,
};
pub use path::{available_names, parse_path, traverse, traverse_with};
pub use report::{describe, describe_chain, ContextEntry};
pub use state::capture_state;
