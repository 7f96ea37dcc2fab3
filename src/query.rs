//! Reading and writing state through a host-owned query string.
//!
//! A [`QuerySync`] decodes typed values from the parameters a [`Navigator`]
//! exposes, and writes updates back as single navigations.

mod navigator;
pub use navigator::{MemoryNavigator, NavigateOptions, Navigator};

mod params;
pub use params::QueryParams;

mod sync;
pub use sync::{Key, QuerySync};
