//! Path traversal
//!
//! A path is a `/`-separated list of attribute names walked from a start
//! value with ordinary attribute access, so each step is bound into the
//! context of the previous one and the resulting wrapper's chain mirrors the
//! path. Integer segments index into lists and sequence objects.

use crate::error::{Result, TreeError};
use acq_core::{base, propagate, protocol, AcqError, Resolver, Value};
use tracing::trace;

/// Split a path into its non-empty segments; `""` and `"/"` are the start itself
pub fn parse_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Walk `path` from `start` with default limits
pub fn traverse(start: &Value, path: &str) -> Result<Value> {
    traverse_with(&Resolver::default(), start, path)
}

/// Walk `path` from `start`
pub fn traverse_with(resolver: &Resolver, start: &Value, path: &str) -> Result<Value> {
    let mut current = start.clone();
    // Items fetched out of a list are bound into the list's owner.
    let mut holder = start.clone();
    let mut reached: Vec<&str> = Vec::new();

    for segment in parse_path(path) {
        trace!(segment, depth = reached.len(), "traversing");
        let next = match (Indexable::of(&current), segment.parse::<i64>()) {
            (Some(kind), Ok(index)) => {
                let item = match protocol::get_item(&current, &Value::Int(index)) {
                    Ok(item) => item,
                    Err(AcqError::IndexOutOfRange { .. }) => {
                        return Err(not_found(path, &reached, &current));
                    }
                    Err(err) => return Err(err.into()),
                };
                match kind {
                    Indexable::List => propagate(item, &holder)?,
                    Indexable::Sequence => {
                        holder = current.clone();
                        propagate(item, &current)?
                    }
                }
            }
            _ => match resolver.getattr(&current, segment) {
                Ok(value) => {
                    holder = current.clone();
                    value
                }
                Err(err) if err.is_not_found() => {
                    return Err(not_found(path, &reached, &current));
                }
                Err(err) => return Err(err.into()),
            },
        };
        reached.push(segment);
        current = next;
    }
    Ok(current)
}

#[derive(Clone, Copy)]
enum Indexable {
    List,
    Sequence,
}

impl Indexable {
    fn of(value: &Value) -> Option<Self> {
        match base(value) {
            Value::List(_) => Some(Indexable::List),
            Value::Object(obj) if obj.as_sequence().is_some() => Some(Indexable::Sequence),
            _ => None,
        }
    }
}

/// Own attribute names of the object behind `value`, sorted
pub fn available_names(value: &Value) -> Vec<String> {
    match base(value) {
        Value::Object(obj) => obj
            .state()
            .map(|state| state.into_iter().map(|(name, _)| name).collect())
            .unwrap_or_default(),
        Value::List(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn not_found(path: &str, reached: &[&str], current: &Value) -> TreeError {
    let names = available_names(current);
    TreeError::PathNotFound {
        path: path.to_string(),
        reached: format!("/{}", reached.join("/")),
        available: if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        },
    }
}
