//! The typed schema derived from a defaults object.
//!
//! Every leaf in the defaults declares both the type of its path and the
//! value the path takes when it is absent from the query string. The
//! [`Schema`] makes that declaration explicit: one [`Field`] per dotted path,
//! tagged with a [`Kind`] the codec dispatches on.

use indexmap::IndexMap;

use super::{
    leaf::{Kind, Leaf, ScalarKind},
    node::{FlatMap, Node},
    path::{DottedPath, InvalidSegmentError, Segment},
};

/// One schema entry: the declared kind and default of a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    kind: Kind,
    default: Leaf,
    /// Element default used when decoding list items that fail to coerce.
    element_default: Leaf,
}

impl Field {
    /// Creates a field whose kind is inferred from `default`.
    #[must_use]
    pub fn new(default: Leaf) -> Self {
        let kind = Kind::of(&default);
        let element_default = match &default {
            Leaf::List(items) => items
                .first()
                .cloned()
                .map_or_else(|| Leaf::Text(String::new()), Leaf::from),
            _ => Leaf::Null,
        };
        Self {
            kind,
            default,
            element_default,
        }
    }

    /// The declared kind.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// The default value.
    #[must_use]
    pub const fn default(&self) -> &Leaf {
        &self.default
    }

    /// For list fields, the first default element (or an empty string when
    /// the default list is empty). [`Leaf::Null`] for other kinds.
    #[must_use]
    pub const fn element_default(&self) -> &Leaf {
        &self.element_default
    }
}

/// Errors raised while building a schema from a defaults object.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    /// An object key is empty or contains the path separator.
    #[error("invalid key under '{parent}': {source}")]
    InvalidKey {
        /// The dotted path of the enclosing object (empty at the root).
        parent: String,
        /// The underlying validation error.
        #[source]
        source: InvalidSegmentError,
    },

    /// A default list mixes element kinds.
    #[error("default list at '{path}' mixes {expected} and {found} elements")]
    MixedList {
        /// The dotted path of the list.
        path: String,
        /// The kind of the first element.
        expected: ScalarKind,
        /// The first conflicting kind.
        found: ScalarKind,
    },

    /// The defaults are a bare leaf rather than an object.
    #[error("defaults must be an object")]
    NotAnObject,
}

/// An immutable mapping from dotted path to [`Field`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, Field>,
}

impl Schema {
    /// Builds a schema from a nested defaults object.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults are not an object, if any key is
    /// empty or contains `.`, or if a default list is not homogeneous.
    pub fn new(defaults: &Node) -> Result<Self, SchemaError> {
        let Node::Object(children) = defaults else {
            return Err(SchemaError::NotAnObject);
        };
        let mut fields = IndexMap::new();
        collect_fields(children, None, &mut fields)?;
        tracing::debug!(paths = fields.len(), "built query schema");
        Ok(Self { fields })
    }

    /// Looks up the field for a dotted path.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Field> {
        self.fields.get(path)
    }

    /// Returns `true` if the path is declared.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    /// Iterates over `(path, field)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(path, field)| (path.as_str(), field))
    }

    /// The number of declared paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no paths are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The flattened defaults.
    #[must_use]
    pub fn defaults(&self) -> FlatMap {
        self.fields
            .iter()
            .map(|(path, field)| (path.clone(), field.default.clone()))
            .collect()
    }
}

fn collect_fields(
    children: &IndexMap<String, Node>,
    parent: Option<&DottedPath>,
    fields: &mut IndexMap<String, Field>,
) -> Result<(), SchemaError> {
    for (key, child) in children {
        let segment =
            Segment::try_from(key.as_str()).map_err(|source| SchemaError::InvalidKey {
                parent: parent.map(ToString::to_string).unwrap_or_default(),
                source,
            })?;
        let path = match parent {
            Some(parent) => parent.child(segment),
            None => DottedPath::root(segment),
        };
        match child {
            Node::Object(grandchildren) => collect_fields(grandchildren, Some(&path), fields)?,
            Node::Leaf(leaf) => {
                check_homogeneous(&path, leaf)?;
                fields.insert(path.to_string(), Field::new(leaf.clone()));
            }
        }
    }
    Ok(())
}

fn check_homogeneous(path: &DottedPath, leaf: &Leaf) -> Result<(), SchemaError> {
    let Leaf::List(items) = leaf else {
        return Ok(());
    };
    let mut kinds = items.iter().map(super::leaf::Scalar::kind);
    let Some(expected) = kinds.next() else {
        return Ok(());
    };
    match kinds.find(|kind| *kind != expected) {
        Some(found) => Err(SchemaError::MixedList {
            path: path.to_string(),
            expected,
            found,
        }),
        None => Ok(()),
    }
}
