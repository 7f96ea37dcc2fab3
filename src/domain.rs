//! Domain models for query-string state.
//!
//! This module contains the typed values stored under dotted paths, the
//! nested objects they are assembled into, the schema inferred from a
//! defaults object, and the codec that maps values to query parameters.

/// Conversion between leaves and query-parameter values.
pub mod codec;

mod config;
pub use config::{Config, History, LoadError, SaveError};

/// Typed leaf values and their kinds.
pub mod leaf;
pub use leaf::{Kind, Leaf, Scalar, ScalarKind};

/// Nested objects, flattening and unflattening.
pub mod node;
pub use node::{FlatMap, JsonError, Node, flatten, unflatten};

/// Validated keys and dotted paths.
pub mod path;
pub use path::{DottedPath, InvalidSegmentError, Segment};

/// The typed schema inferred from defaults.
pub mod schema;
pub use schema::{Field, Schema, SchemaError};
