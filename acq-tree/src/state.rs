//! State capture
//!
//! Converts plain data and instances back into JSON. Wrappers carry a
//! context, not state, and are refused with `NotSerializable`.

use crate::error::{Result, TreeError};
use crate::loader::{ACQUIRE_MARKER, MODE_KEY, TYPE_KEY};
use acq_core::{AcqError, Mode, Value};
use serde_json::{Map, Number};
use std::collections::HashSet;

/// Persistable form of `value`.
///
/// Instances become objects with sorted keys plus `@type` (and `@mode`
/// when it differs from implicit). Parent pointers and methods are left out.
pub fn capture_state(value: &Value) -> Result<serde_json::Value> {
    let mut active = HashSet::new();
    capture(value, &mut active)
}

fn capture(value: &Value, active: &mut HashSet<usize>) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Wrapper(_) => return Err(AcqError::NotSerializable.into()),
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| TreeError::InvalidTree(format!("{} has no JSON form", f)))?,
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Acquired(_) => serde_json::Value::String(ACQUIRE_MARKER.to_string()),
        Value::Method(method) => {
            let what = format!("method {}", method.name());
            return Err(AcqError::unsupported("state capture", what).into());
        }
        Value::List(items) => {
            let items = items.borrow().clone();
            enter(value, active)?;
            let captured = items
                .iter()
                .map(|item| capture(item, active))
                .collect::<Result<Vec<_>>>();
            leave(value, active);
            serde_json::Value::Array(captured?)
        }
        Value::Object(obj) => {
            let state = obj
                .state()
                .ok_or_else(|| AcqError::unsupported("state capture", obj.type_name()))?;
            enter(value, active)?;
            let mut fields = Map::new();
            fields.insert(
                TYPE_KEY.to_string(),
                serde_json::Value::String(obj.type_name().to_string()),
            );
            match obj.acquisition_mode() {
                Some(Mode::Implicit) => {}
                Some(Mode::Explicit) => {
                    fields.insert(MODE_KEY.to_string(), "explicit".into());
                }
                None => {
                    fields.insert(MODE_KEY.to_string(), "none".into());
                }
            }
            let mut result = Ok(());
            for (name, attr) in state {
                if matches!(attr, Value::Method(_)) {
                    continue;
                }
                match capture(&attr, active) {
                    Ok(captured) => {
                        fields.insert(name, captured);
                    }
                    Err(err) => {
                        result = Err(err);
                        break;
                    }
                }
            }
            leave(value, active);
            result?;
            serde_json::Value::Object(fields)
        }
    })
}

fn enter(value: &Value, active: &mut HashSet<usize>) -> Result<()> {
    if let Some(id) = value.identity() {
        if !active.insert(id) {
            return Err(TreeError::InvalidTree(format!(
                "{} contains itself",
                value.type_name()
            )));
        }
    }
    Ok(())
}

fn leave(value: &Value, active: &mut HashSet<usize>) {
    if let Some(id) = value.identity() {
        active.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_json;
    use serde_json::json;

    #[test]
    fn test_round_trip_through_loader() {
        let document = json!({
            "@type": "Site",
            "title": "root",
            "child": { "@mode": "explicit", "n": 1, "marker": "@acquire" },
            "tags": ["a", null, 1.5]
        });
        let tree = load_json(&document).unwrap();
        assert_eq!(capture_state(tree.root()).unwrap(), json!({
            "@type": "Site",
            "title": "root",
            "child": { "@type": "Node", "@mode": "explicit", "n": 1, "marker": "@acquire" },
            "tags": ["a", null, 1.5]
        }));
    }

    #[test]
    fn test_wrappers_are_refused() {
        let tree = load_json(&json!({ "child": {} })).unwrap();
        let child = acq_core::getattr(tree.root(), "child").unwrap();
        assert!(matches!(
            capture_state(&child),
            Err(TreeError::Acquisition(AcqError::NotSerializable))
        ));
        assert_eq!(
            capture_state(&acq_core::base(&child)).unwrap(),
            json!({ "@type": "Node" })
        );
    }

    #[test]
    fn test_self_containing_list() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert!(matches!(
            capture_state(&list),
            Err(TreeError::InvalidTree(_))
        ));
        if let Value::List(items) = &list {
            items.borrow_mut().clear();
        }
    }
}
