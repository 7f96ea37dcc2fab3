//! The host navigation layer that owns the query string.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::QueryParams;

/// Access to the query parameters owned by a host.
///
/// The synchroniser never caches the parameters: every read asks the host,
/// and every write is a single call to [`Navigator::set_search_params`].
pub trait Navigator {
    /// Host-specific navigation settings, forwarded untouched.
    type Options;

    /// A snapshot of the current parameters.
    fn search_params(&self) -> QueryParams;

    /// Replaces the parameters with the result of `update`.
    ///
    /// `update` receives the previous parameters and returns the next ones;
    /// the host applies the result as one navigation.
    fn set_search_params<F>(&mut self, update: F, options: Option<Self::Options>)
    where
        F: FnOnce(&QueryParams) -> QueryParams;
}

/// Navigation settings understood by [`MemoryNavigator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateOptions {
    /// Overwrite the current history entry instead of adding one.
    pub replace: bool,
}

impl NavigateOptions {
    /// Options that push a new history entry.
    #[must_use]
    pub const fn push() -> Self {
        Self { replace: false }
    }

    /// Options that replace the current history entry.
    #[must_use]
    pub const fn replace() -> Self {
        Self { replace: true }
    }
}

/// An in-memory host with a linear history of query strings.
///
/// Pushing a navigation discards any entries ahead of the current one, the
/// way a browser does after going back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNavigator {
    entries: Vec<QueryParams>,
    current: usize,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(QueryParams::new())
    }
}

impl MemoryNavigator {
    /// A history with a single entry.
    #[must_use]
    pub fn new(initial: QueryParams) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
        }
    }

    /// The parameters of the current entry.
    #[must_use]
    pub fn current(&self) -> &QueryParams {
        &self.entries[self.current]
    }

    /// The current entry rendered as a query string, without a leading `?`.
    #[must_use]
    pub fn location(&self) -> String {
        self.current().to_string()
    }

    /// The number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }

    /// Moves to the previous entry. Returns `false` at the start of history.
    pub const fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Moves to the next entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.current + 1 >= self.entries.len() {
            return false;
        }
        self.current += 1;
        true
    }
}

impl Navigator for MemoryNavigator {
    type Options = NavigateOptions;

    fn search_params(&self) -> QueryParams {
        self.current().clone()
    }

    #[instrument(level = "trace", skip(self, update))]
    fn set_search_params<F>(&mut self, update: F, options: Option<Self::Options>)
    where
        F: FnOnce(&QueryParams) -> QueryParams,
    {
        let next = update(self.current());
        if options.unwrap_or_default().replace {
            self.entries[self.current] = next;
        } else {
            self.entries.truncate(self.current + 1);
            self.entries.push(next);
            self.current += 1;
        }
    }
}
