//! Building containment trees from JSON and TOML documents
//!
//! Every JSON object (TOML table) becomes an [`Instance`] whose class is
//! named by its `@type` key (default `Node`) and acquires implicitly unless
//! `@mode` says otherwise. Nested objects point back at their enclosing
//! object through a weak `__parent__` pointer, so acquisition works on them
//! even when they are reached without a wrapper.

use crate::error::{Result, TreeError};
use crate::path;
use acq_core::{Class, Instance, Mode, Resolver, Value};
use serde_json::Map;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// Directive naming the node's class
pub const TYPE_KEY: &str = "@type";
/// Directive selecting `implicit`, `explicit` or `none`
pub const MODE_KEY: &str = "@mode";
/// String value standing for the force-acquisition marker
pub const ACQUIRE_MARKER: &str = "@acquire";

const DEFAULT_TYPE: &str = "Node";
const MAX_NESTING: usize = 128;

/// A loaded tree. Holds a strong handle to every node.
pub struct Tree {
    root: Value,
    nodes: Vec<Value>,
}

impl Tree {
    /// The top-level node
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Every node, root first, in document order
    pub fn nodes(&self) -> &[Value] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes (never true for a loaded tree)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk `path` from the root, binding every step into its context
    pub fn resolve(&self, path: &str) -> Result<Value> {
        path::traverse(&self.root, path)
    }

    /// [`Tree::resolve`] with custom resolution limits
    pub fn resolve_with(&self, resolver: &Resolver, path: &str) -> Result<Value> {
        path::traverse_with(resolver, &self.root, path)
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    /// JSON document
    Json,
    /// TOML document
    Toml,
}

impl TreeFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(TreeFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(TreeFormat::Toml),
            other => Err(TreeError::InvalidTree(format!(
                "unsupported tree format '{}' for {} (expected .json or .toml)",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Build a tree from a parsed JSON document
pub fn load_json(document: &serde_json::Value) -> Result<Tree> {
    let serde_json::Value::Object(fields) = document else {
        return Err(TreeError::InvalidTree(format!(
            "root must be an object, found {}",
            json_kind(document)
        )));
    };
    let mut builder = Builder::default();
    let root = builder.node(fields, None, 0)?;
    debug!(nodes = builder.nodes.len(), classes = builder.classes.len(), "loaded tree");
    Ok(Tree {
        root,
        nodes: builder.nodes,
    })
}

/// Build a tree from JSON text
pub fn load_json_str(text: &str) -> Result<Tree> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    load_json(&document)
}

/// Build a tree from TOML text
pub fn load_toml_str(text: &str) -> Result<Tree> {
    let document: toml::Value = toml::from_str(text)?;
    load_json(&toml_to_json(document))
}

/// Read and build a tree; the format follows the file extension
pub fn load_path(path: impl AsRef<Path>) -> Result<Tree> {
    let path = path.as_ref();
    let format = TreeFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "reading tree");
    match format {
        TreeFormat::Json => load_json_str(&text),
        TreeFormat::Toml => load_toml_str(&text),
    }
}

/// Convert plain JSON data into a value.
///
/// Objects are refused: a node needs a tree to own it.
pub fn scalar_from_json(value: &serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Object(_) => Err(TreeError::InvalidTree(
            "expected a scalar or an array, found object".to_string(),
        )),
        serde_json::Value::Array(items) => Ok(Value::list(
            items.iter().map(scalar_from_json).collect::<Result<Vec<_>>>()?,
        )),
        other => Builder::default().value(other, &Value::None, 0),
    }
}

fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Builder {
    classes: HashMap<(String, Option<Mode>), Rc<Class>>,
    nodes: Vec<Value>,
}

impl Builder {
    fn class(&mut self, name: &str, mode: Option<Mode>) -> Rc<Class> {
        self.classes
            .entry((name.to_string(), mode))
            .or_insert_with(|| {
                Rc::new(match mode {
                    Some(Mode::Implicit) => Class::implicit(name),
                    Some(Mode::Explicit) => Class::explicit(name),
                    None => Class::new(name),
                })
            })
            .clone()
    }

    fn node(
        &mut self,
        fields: &Map<String, serde_json::Value>,
        parent: Option<&Value>,
        depth: usize,
    ) -> Result<Value> {
        if depth > MAX_NESTING {
            return Err(TreeError::InvalidTree(format!(
                "nesting deeper than {} levels",
                MAX_NESTING
            )));
        }

        let type_name = match fields.get(TYPE_KEY) {
            None => DEFAULT_TYPE,
            Some(serde_json::Value::String(name)) if !name.is_empty() => name.as_str(),
            Some(other) => {
                return Err(TreeError::InvalidTree(format!(
                    "{} must be a non-empty string, found {}",
                    TYPE_KEY,
                    json_kind(other)
                )))
            }
        };
        let mode = match fields.get(MODE_KEY) {
            None => Some(Mode::Implicit),
            Some(serde_json::Value::String(mode)) => parse_mode(mode)?,
            Some(other) => {
                return Err(TreeError::InvalidTree(format!(
                    "{} must be a string, found {}",
                    MODE_KEY,
                    json_kind(other)
                )))
            }
        };

        let instance = Instance::new(&self.class(type_name, mode));
        if let Some(parent) = parent {
            instance.set_parent(parent);
        }
        let node: Value = instance.clone().into();
        self.nodes.push(node.clone());

        for (key, value) in fields {
            if key == TYPE_KEY || key == MODE_KEY {
                continue;
            }
            if key.starts_with('@') {
                return Err(TreeError::InvalidTree(format!("unknown directive '{}'", key)));
            }
            if key.is_empty() || key.contains('/') {
                return Err(TreeError::InvalidTree(format!(
                    "attribute name '{}' must be non-empty and contain no '/'",
                    key
                )));
            }
            let converted = self.value(value, &node, depth + 1)?;
            instance.set(key, converted);
        }
        Ok(node)
    }

    fn value(&mut self, value: &serde_json::Value, owner: &Value, depth: usize) -> Result<Value> {
        Ok(match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) if s == ACQUIRE_MARKER => Value::acquired(),
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.value(item, owner, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Value::list(items)
            }
            serde_json::Value::Object(fields) => self.node(fields, Some(owner), depth)?,
        })
    }
}

fn parse_mode(mode: &str) -> Result<Option<Mode>> {
    match mode {
        "implicit" => Ok(Some(Mode::Implicit)),
        "explicit" => Ok(Some(Mode::Explicit)),
        "none" => Ok(None),
        other => Err(TreeError::InvalidTree(format!(
            "unknown {} '{}' (expected implicit, explicit or none)",
            MODE_KEY, other
        ))),
    }
}
