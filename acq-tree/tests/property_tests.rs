//! Property-based tests for loading and traversal

use acq_core::getattr;
use acq_tree::{capture_state, load_json};
use proptest::prelude::*;
use serde_json::{json, Map, Value as Json};

fn nested(depth: usize, color: &str) -> Json {
    let mut node = json!({ "leaf": true });
    for _ in 0..depth {
        node = json!({ "n": node });
    }
    if let Json::Object(fields) = &mut node {
        fields.insert("color".to_string(), Json::String(color.to_string()));
    }
    node
}

fn scalar() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i64>().prop_map(Json::from),
        "[a-z]{0,8}".prop_map(Json::String),
    ]
}

proptest! {
    #[test]
    fn traversal_acquires_from_root(depth in 1usize..40, color in "[a-z]{1,8}") {
        let tree = load_json(&nested(depth, &color)).unwrap();
        let path = vec!["n"; depth].join("/");
        let node = tree.resolve(&path).unwrap();
        let found = getattr(&node, "color").unwrap();
        prop_assert_eq!(found.as_str(), Some(color.as_str()));
        prop_assert_eq!(tree.len(), depth + 1);
    }

    #[test]
    fn capture_is_stable(fields in prop::collection::btree_map("[a-z]{1,6}", scalar(), 0..8)) {
        let document = Json::Object(fields.into_iter().collect::<Map<String, Json>>());
        let first = capture_state(load_json(&document).unwrap().root()).unwrap();
        let second = capture_state(load_json(&first).unwrap().root()).unwrap();
        prop_assert_eq!(first, second);
    }
}
