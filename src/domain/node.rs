//! Nested state objects and their flat, dotted-path form.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{
    leaf::{Leaf, Scalar, iso_string, safe_integer},
    path::SEPARATOR,
};

/// A flat mapping from dotted path to leaf, in insertion order.
pub type FlatMap = IndexMap<String, Leaf>;

/// A nested state object.
///
/// Object keys keep their insertion order, so flattening and rendering a
/// query string are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf value.
    Leaf(Leaf),
    /// A nested object.
    Object(IndexMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Self::object()
    }
}

impl Node {
    /// An empty object.
    #[must_use]
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Builder-style insertion of a child under `key`.
    ///
    /// A leaf node is turned into an empty object first.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Self>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a child under `key`, returning the previous child if any.
    ///
    /// A leaf node is turned into an empty object first.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Self>) -> Option<Self> {
        self.make_object().insert(key.into(), value.into())
    }

    /// Returns the direct child under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(children) => children.get(key),
            Self::Leaf(_) => None,
        }
    }

    /// Follows a dotted path through nested objects.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Self> {
        path.split(SEPARATOR)
            .try_fold(self, |node, segment| node.get(segment))
    }

    /// Returns the leaf, if this node is one.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Object(_) => None,
        }
    }

    /// Returns the children, if this node is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Object(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    /// Converts a JSON value into a node.
    ///
    /// Objects become objects, arrays become lists and `null` becomes a null
    /// leaf. Strings stay text, since JSON has no date type. Lists are not
    /// checked for homogeneity here; [`Schema::new`](super::Schema::new)
    /// does that.
    ///
    /// # Errors
    ///
    /// Returns an error if an array holds anything other than strings,
    /// numbers and booleans.
    pub fn from_json(value: Value) -> Result<Self, JsonError> {
        json_to_node(value, "")
    }

    /// Renders the node as JSON. Dates become their ISO string.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
            Self::Leaf(Leaf::List(items)) => {
                Value::Array(items.iter().map(scalar_to_json).collect())
            }
            Self::Leaf(leaf) => leaf
                .as_scalar()
                .map_or(Value::Null, |scalar| scalar_to_json(&scalar)),
        }
    }

    fn make_object(&mut self) -> &mut IndexMap<String, Self> {
        if let Self::Leaf(_) = self {
            *self = Self::object();
        }
        match self {
            Self::Object(children) => children,
            Self::Leaf(_) => unreachable!("leaf replaced by an object above"),
        }
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

macro_rules! impl_from_leaf {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Node {
                fn from(value: $source) -> Self {
                    Self::Leaf(value.into())
                }
            }
        )*
    };
}

impl_from_leaf!(String, &str, f64, i32, u32, bool, DateTime<Utc>);

impl<T: Into<Scalar>> From<Vec<T>> for Node {
    fn from(items: Vec<T>) -> Self {
        Self::Leaf(Leaf::list(items))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(leaf) => leaf.serialize(serializer),
            Self::Object(children) => serializer.collect_map(children),
        }
    }
}

/// Error returned when a JSON value has no node equivalent.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported JSON value at '{path}': {reason}")]
pub struct JsonError {
    /// The dotted path of the offending value (empty at the root).
    pub path: String,
    /// Why it cannot be used.
    pub reason: &'static str,
}

fn json_to_node(value: Value, path: &str) -> Result<Node, JsonError> {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, child)| {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}{SEPARATOR}{key}")
                };
                json_to_node(child, &child_path).map(|child| (key, child))
            })
            .collect::<Result<_, _>>()
            .map(Node::Object),
        Value::Array(items) => items
            .into_iter()
            .map(|item| json_to_scalar(item, path))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Node::Leaf(Leaf::List(items))),
        Value::Null => Ok(Node::Leaf(Leaf::Null)),
        scalar => json_to_scalar(scalar, path).map(|scalar| Node::Leaf(scalar.into())),
    }
}

fn json_to_scalar(value: Value, path: &str) -> Result<Scalar, JsonError> {
    let unsupported = |reason| JsonError {
        path: path.to_string(),
        reason,
    };
    match value {
        Value::String(text) => Ok(Scalar::Text(text)),
        Value::Bool(flag) => Ok(Scalar::Bool(flag)),
        Value::Number(number) => number
            .as_f64()
            .map(Scalar::Number)
            .ok_or_else(|| unsupported("number out of range")),
        Value::Null => Err(unsupported("lists cannot contain null")),
        Value::Array(_) => Err(unsupported("lists cannot be nested")),
        Value::Object(_) => Err(unsupported("lists cannot contain objects")),
    }
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Text(text) => Value::String(text.clone()),
        Scalar::Number(number) => safe_integer(*number).map_or_else(
            || serde_json::Number::from_f64(*number).map_or(Value::Null, Value::Number),
            Value::from,
        ),
        Scalar::Bool(flag) => Value::Bool(*flag),
        Scalar::Date(instant) => Value::String(iso_string(instant)),
    }
}

/// Flattens a nested object into dotted paths.
///
/// Only objects are descended into; lists and dates are leaves. A leaf at the
/// root has no path and produces an empty map, as does an empty object at any
/// depth.
#[must_use]
pub fn flatten(node: &Node) -> FlatMap {
    let mut flat = FlatMap::new();
    if let Node::Object(children) = node {
        flatten_into(children, "", &mut flat);
    }
    flat
}

fn flatten_into(children: &IndexMap<String, Node>, prefix: &str, flat: &mut FlatMap) {
    for (key, child) in children {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{SEPARATOR}{key}")
        };
        match child {
            Node::Object(grandchildren) => flatten_into(grandchildren, &path, flat),
            Node::Leaf(leaf) => {
                flat.insert(path, leaf.clone());
            }
        }
    }
}

/// Rebuilds a nested object from dotted paths.
///
/// Intermediate objects are created on demand. If an earlier path stored a
/// leaf where a later path needs an object, the leaf is replaced.
#[must_use]
pub fn unflatten(flat: &FlatMap) -> Node {
    let mut root = Node::object();
    for (path, leaf) in flat {
        let mut segments: Vec<&str> = path.split(SEPARATOR).collect();
        let last = segments.pop().unwrap_or_default();
        let mut current = &mut root;
        for segment in segments {
            current = current
                .make_object()
                .entry(segment.to_string())
                .or_insert_with(Node::object);
        }
        current.insert(last, leaf.clone());
    }
    root
}
