//! ACQ Test Utilities
//!
//! This crate provides shared fixtures and helpers for the ACQ tests:
//! node builders, canned containment trees, sample objects implementing the
//! capability traits, and a recording filter.

use acq_core::{Class, Instance, Value, Wrapper};
use std::rc::Rc;

pub mod samples;

pub use samples::{
    Countdown, FilterCall, FortyTwo, LabelSequence, NumberBox, RecordingFilter, Registry,
};

/// Builder for creating instances with common patterns
pub struct NodeBuilder {
    class: Class,
    attrs: Vec<(String, Value)>,
    parent: Option<Value>,
}

impl NodeBuilder {
    /// Node of an implicitly acquiring class
    pub fn implicit(class_name: &str) -> Self {
        Self::with_class(Class::implicit(class_name))
    }

    /// Node of an explicitly acquiring class
    pub fn explicit(class_name: &str) -> Self {
        Self::with_class(Class::explicit(class_name))
    }

    /// Node of a class that does not acquire
    pub fn plain(class_name: &str) -> Self {
        Self::with_class(Class::new(class_name))
    }

    fn with_class(class: Class) -> Self {
        Self {
            class,
            attrs: Vec::new(),
            parent: None,
        }
    }

    /// Add an attribute shared through the class
    pub fn class_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.class = self.class.with_attr(name, value);
        self
    }

    /// Add a method returning the value of `attr` acquired from the receiver
    pub fn reporter(mut self, name: &str, attr: &'static str) -> Self {
        self.class = self
            .class
            .with_method(name, move |receiver, _| acq_core::getattr(receiver, attr));
        self
    }

    /// Add an instance attribute
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    /// Set the native parent pointer
    pub fn parent(mut self, parent: &Value) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Build the node
    pub fn build(self) -> Value {
        let instance = Instance::new(&Rc::new(self.class));
        for (name, value) in self.attrs {
            instance.set(&name, value);
        }
        if let Some(parent) = &self.parent {
            instance.set_parent(parent);
        }
        instance.into()
    }
}

/// Three nested folders reached from the root by attribute access
pub struct Story {
    /// Outermost folder: `color = "red"`, `title = "root"`
    pub root: Value,
    /// `root.mid`: `title = "mid"`, `size = 2`
    pub mid: Value,
    /// `mid.leaf`: `title = "leaf"`, a `report` method returning the acquired color
    pub leaf: Value,
}

impl Story {
    /// `leaf` as reached through `root.mid.leaf`
    pub fn wrapped_leaf(&self) -> Value {
        Value::Wrapper(Wrapper::implicit(self.leaf.clone(), self.wrapped_mid()))
    }

    /// `mid` as reached through `root.mid`
    pub fn wrapped_mid(&self) -> Value {
        Value::Wrapper(Wrapper::implicit(self.mid.clone(), self.root.clone()))
    }
}

/// Generate canned containment structures
pub struct Fixtures;

impl Fixtures {
    /// Root, mid and leaf folders linked by attributes
    pub fn story() -> Story {
        let leaf = NodeBuilder::implicit("Leaf")
            .reporter("report", "color")
            .attr("title", "leaf")
            .build();
        let mid = NodeBuilder::implicit("Folder")
            .attr("title", "mid")
            .attr("size", 2)
            .attr("leaf", leaf.clone())
            .build();
        let root = NodeBuilder::implicit("Folder")
            .attr("title", "root")
            .attr("color", "red")
            .attr("mid", mid.clone())
            .build();
        Story { root, mid, leaf }
    }

    /// `depth + 1` nodes where each one's parent pointer is the next.
    ///
    /// The last node carries `marker = depth`. All nodes are returned so the
    /// caller keeps the weak parent pointers alive.
    pub fn parent_chain(depth: usize) -> Vec<Value> {
        let top = NodeBuilder::implicit("Node")
            .attr("marker", depth as i64)
            .build();
        let mut nodes = vec![top];
        for i in 0..depth {
            let parent = nodes[nodes.len() - 1].clone();
            let node = NodeBuilder::implicit("Node")
                .attr("index", i as i64)
                .parent(&parent)
                .build();
            nodes.push(node);
        }
        nodes.reverse();
        nodes
    }

    /// A wrapper chain `depth` levels deep; the outermost context carries `marker`
    pub fn wrapped_chain(depth: usize) -> Value {
        let mut context = NodeBuilder::implicit("Node")
            .attr("marker", depth as i64)
            .build();
        for i in 0..depth {
            let node = NodeBuilder::implicit("Node").attr("index", i as i64).build();
            context = Value::Wrapper(Wrapper::implicit(node, context));
        }
        context
    }

    /// JSON document describing the story as a configuration tree
    pub fn story_json() -> serde_json::Value {
        serde_json::json!({
            "@type": "Site",
            "title": "root",
            "color": "red",
            "_secret": "hidden",
            "mid": {
                "@type": "Folder",
                "title": "mid",
                "size": 2,
                "leaf": {
                    "@type": "Document",
                    "title": "leaf",
                    "color": "@acquire",
                    "tags": ["a", "b"]
                }
            },
            "archive": {
                "@mode": "explicit",
                "title": "archive",
                "old": { "title": "old" }
            }
        })
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use acq_core::{AcqError, Result, Value};

    /// Assert that two values are the same object (or equal scalars)
    pub fn assert_same(actual: &Value, expected: &Value, context: &str) {
        if !actual.is(expected) {
            panic!(
                "identity assertion failed in {}:\nExpected: {:?}\nActual: {:?}",
                context, expected, actual
            );
        }
    }

    /// Assert that a lookup failed with `AttributeNotFound` for `name`
    pub fn assert_not_found(result: Result<Value>, name: &str) {
        match result {
            Err(AcqError::AttributeNotFound { name: missing }) if missing == name => {}
            other => panic!("expected AttributeNotFound({}), got {:?}", name, other),
        }
    }

    /// Number of wrapper layers around the innermost object
    pub fn wrapper_depth(value: &Value) -> usize {
        let mut depth = 0;
        let mut current = value.clone();
        while let Value::Wrapper(wrapper) = current {
            depth += 1;
            current = wrapper.wrapped();
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = NodeBuilder::implicit("Folder")
            .attr("title", "x")
            .class_attr("kind", "folder")
            .build();
        let obj = node.as_object().unwrap();
        assert_eq!(obj.type_name(), "Folder");
        assert_eq!(obj.get_attr("title").unwrap().as_str(), Some("x"));
        assert_eq!(obj.get_attr("kind").unwrap().as_str(), Some("folder"));
    }

    #[test]
    fn test_parent_chain_links() {
        let nodes = Fixtures::parent_chain(3);
        assert_eq!(nodes.len(), 4);
        let parent = nodes[0].as_object().unwrap().parent().unwrap();
        assert!(parent.is(&nodes[1]));
        assert!(nodes[3].as_object().unwrap().parent().is_none());
    }

    #[test]
    fn test_wrapper_depth() {
        let chain = Fixtures::wrapped_chain(4);
        assert_eq!(assertions::wrapper_depth(&chain), 1);
        assert_eq!(assertions::wrapper_depth(&Value::Int(1)), 0);
    }
}
