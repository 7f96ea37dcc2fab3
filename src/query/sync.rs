//! Keeps a nested state object in step with the host's query string.
//!
//! The [`QuerySync`] holds only the schema. The query parameters belong to the
//! [`Navigator`]; every read decodes them afresh and every write is one
//! navigation computed from a snapshot of the previous parameters.
//!
//! Writes keep the query string canonical: a path set to its default (or to
//! null) is removed rather than written, so equal states produce equal URLs.

use tracing::instrument;

use super::{Navigator, QueryParams};
use crate::domain::{
    FlatMap, Leaf, Node, Schema, SchemaError,
    codec::{is_equal, parse_value, serialize_value},
    flatten, unflatten,
};

/// Synchronises a nested state object with a navigator's query parameters.
#[derive(Debug, Clone)]
pub struct QuerySync<N> {
    schema: Schema,
    navigator: N,
}

impl<N: Navigator> QuerySync<N> {
    /// Creates a synchroniser whose schema is inferred from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults are not a valid schema (see
    /// [`Schema::new`]).
    pub fn new(defaults: &Node, navigator: N) -> Result<Self, SchemaError> {
        Ok(Self::with_schema(Schema::new(defaults)?, navigator))
    }

    /// Creates a synchroniser from a prebuilt schema.
    #[must_use]
    pub const fn with_schema(schema: Schema, navigator: N) -> Self {
        Self { schema, navigator }
    }

    /// The schema fixed at construction.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The host navigator.
    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Mutable access to the host navigator.
    pub const fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// Consumes the synchroniser, returning the navigator.
    #[must_use]
    pub fn into_navigator(self) -> N {
        self.navigator
    }

    /// The current value of every schema path, decoded from the query.
    #[must_use]
    pub fn flat_values(&self) -> FlatMap {
        let params = self.navigator.search_params();
        self.schema
            .iter()
            .map(|(path, field)| (path.to_string(), parse_value(params.get(path), field)))
            .collect()
    }

    /// The current state as a nested object shaped like the defaults.
    #[must_use]
    pub fn values(&self) -> Node {
        unflatten(&self.flat_values())
    }

    /// The current value of one path, or `None` if the path is not in the
    /// schema.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<Leaf> {
        let field = self.schema.field(path)?;
        Some(parse_value(self.navigator.search_params().get(path), field))
    }

    /// A handle for reading and writing a single path.
    pub fn key<'a>(&'a mut self, path: &'a str) -> Key<'a, N> {
        Key { sync: self, path }
    }

    /// Applies a batch of updates as one navigation.
    ///
    /// `updates` is flattened; each path set to null or to its default is
    /// removed, every other path is written encoded. Paths outside the schema
    /// are written as given.
    #[instrument(level = "debug", skip_all)]
    pub fn set(&mut self, updates: &Node, options: Option<N::Options>) {
        let flat = flatten(updates);
        tracing::debug!(paths = flat.len(), "applying updates");
        let schema = &self.schema;
        self.navigator.set_search_params(
            |previous| {
                let mut next = previous.clone();
                for (path, value) in &flat {
                    reconcile(&mut next, schema, path, value);
                }
                next
            },
            options,
        );
    }

    /// Updates a single path as one navigation, with the same rules as
    /// [`QuerySync::set`].
    #[instrument(level = "debug", skip(self, value, options))]
    pub fn set_path(&mut self, path: &str, value: impl Into<Leaf>, options: Option<N::Options>) {
        let value = value.into();
        let schema = &self.schema;
        self.navigator.set_search_params(
            |previous| {
                let mut next = previous.clone();
                reconcile(&mut next, schema, path, &value);
                next
            },
            options,
        );
    }

    /// Replaces the query with the baseline for the schema.
    ///
    /// Every path is written with its encoded default, except paths whose
    /// default is null or an empty list. Other parameters are dropped.
    #[instrument(level = "debug", skip_all)]
    pub fn reset(&mut self, options: Option<N::Options>) {
        let schema = &self.schema;
        self.navigator.set_search_params(
            |_| {
                schema
                    .iter()
                    .filter(|(_, field)| !field.default().is_empty())
                    .map(|(path, field)| (path, serialize_value(field.default())))
                    .collect::<QueryParams>()
            },
            options,
        );
    }
}

/// A single path of a [`QuerySync`].
#[derive(Debug)]
pub struct Key<'a, N> {
    sync: &'a mut QuerySync<N>,
    path: &'a str,
}

impl<N: Navigator> Key<'_, N> {
    /// The path this handle refers to.
    #[must_use]
    pub const fn path(&self) -> &str {
        self.path
    }

    /// The current decoded value, or `None` if the path is not in the
    /// schema.
    #[must_use]
    pub fn value(&self) -> Option<Leaf> {
        self.sync.value(self.path)
    }

    /// Sets the path, removing the parameter if `value` is null or the
    /// default.
    pub fn set(self, value: impl Into<Leaf>, options: Option<N::Options>) {
        self.sync.set_path(self.path, value, options);
    }
}

fn reconcile(params: &mut QueryParams, schema: &Schema, path: &str, value: &Leaf) {
    let field = schema.field(path);
    let is_default = field.is_some_and(|field| is_equal(value, field.default()));
    if value.is_null() || is_default {
        tracing::debug!(path, "removing parameter");
        params.delete(path);
    } else {
        if field.is_none() {
            tracing::debug!(path, "writing parameter outside the schema");
        }
        params.set(path, serialize_value(value));
    }
}
