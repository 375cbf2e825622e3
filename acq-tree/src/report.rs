//! Display summaries of values and context chains

use crate::path::available_names;
use acq_core::{base, Value};
use serde::Serialize;

/// One context in a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    /// `wrapper` or `object`
    pub kind: &'static str,
    /// Type of the object behind the context
    pub type_name: String,
    /// Wrapper type, when the context is a wrapper
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<&'static str>,
    /// Own attribute names of the object behind the context
    pub attributes: Vec<String>,
}

/// Summarize a single value
pub fn describe(value: &Value) -> ContextEntry {
    let wrapper = value.as_wrapper().map(|w| w.type_name());
    ContextEntry {
        kind: if wrapper.is_some() { "wrapper" } else { "object" },
        type_name: base(value).type_name(),
        wrapper,
        attributes: available_names(value),
    }
}

/// Summarize every context of a chain, closest first
pub fn describe_chain(contexts: &[Value]) -> Vec<ContextEntry> {
    contexts.iter().map(describe).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_json;
    use serde_json::json;

    #[test]
    fn test_chain_report() {
        let tree =
            load_json(&json!({ "@type": "Site", "a": { "@type": "Folder", "x": 1 } })).unwrap();
        let a = acq_core::getattr(tree.root(), "a").unwrap();
        let entries = describe_chain(&acq_core::chain(&a, false).unwrap());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "wrapper");
        assert_eq!(entries[0].type_name, "Folder");
        assert_eq!(entries[0].wrapper, Some("ImplicitAcquisitionWrapper"));
        assert_eq!(entries[0].attributes, vec!["x".to_string()]);
        assert_eq!(entries[1].kind, "object");
        assert_eq!(entries[1].attributes, vec!["a".to_string()]);

        let encoded = serde_json::to_value(&entries[1]).unwrap();
        assert!(encoded.get("wrapper").is_none());
    }
}
