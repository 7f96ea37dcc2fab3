//! Typed application state kept in a URL query string.
//!
//! A defaults object fixes the shape and the value kinds of the state. Each
//! leaf is stored under its dotted path as one query parameter, and only
//! values that differ from their defaults are written.

pub mod domain;
pub use domain::{Config, Leaf, Node, Schema, flatten, unflatten};

/// Synchronisation between nested state and query parameters.
pub mod query;
pub use query::{MemoryNavigator, NavigateOptions, Navigator, QueryParams, QuerySync};
