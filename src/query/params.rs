//! An ordered query-parameter list.

use std::{fmt, str::FromStr};

/// The parameters of a query string, in order, duplicates allowed.
///
/// Mirrors the browser's `URLSearchParams`: [`QueryParams::get`] reads the
/// first occurrence, [`QueryParams::set`] overwrites the first occurrence in
/// place and drops the rest, and [`QueryParams::delete`] removes every
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// An empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// The first value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if `name` occurs at least once.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Sets `name` to `value`.
    ///
    /// The first occurrence keeps its position; later duplicates are removed.
    /// A new name is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter().position(|(key, _)| *key == name) {
            Some(first) => {
                self.0[first].1 = value;
                let mut index = 0;
                self.0.retain(|(key, _)| {
                    let keep = index <= first || *key != name;
                    index += 1;
                    keep
                });
            }
            None => self.0.push((name, value)),
        }
    }

    /// Appends a `name=value` pair, keeping existing occurrences.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Removes every occurrence of `name`.
    pub fn delete(&mut self, name: &str) {
        self.0.retain(|(key, _)| key != name);
    }

    /// The number of pairs, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl FromStr for QueryParams {
    type Err = serde_urlencoded::de::Error;

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored and `+` decodes to a space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let query = s.strip_prefix('?').unwrap_or(s);
        serde_urlencoded::from_str(query).map(Self)
    }
}

impl fmt::Display for QueryParams {
    /// Renders the parameters as an `application/x-www-form-urlencoded`
    /// query string, without a leading `?`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered = serde_urlencoded::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_strings() {
        let params: QueryParams = "?page=3&q=hello+world&tags=a%2Cb".parse().unwrap();
        assert_eq!(params.get("page"), Some("3"));
        assert_eq!(params.get("q"), Some("hello world"));
        assert_eq!(params.get("tags"), Some("a,b"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!("".parse::<QueryParams>().unwrap().is_empty());
        assert!("?".parse::<QueryParams>().unwrap().is_empty());
    }

    #[test]
    fn get_returns_first_occurrence() {
        let params: QueryParams = "a=1&a=2".parse().unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get_all("a").collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn set_replaces_in_place_and_drops_duplicates() {
        let mut params: QueryParams = "a=1&b=2&a=3".parse().unwrap();
        params.set("a", "9");
        assert_eq!(params.to_string(), "a=9&b=2");
    }

    #[test]
    fn set_appends_new_names() {
        let mut params = QueryParams::new();
        params.set("page", "3");
        params.set("sort", "asc");
        assert_eq!(params.to_string(), "page=3&sort=asc");
    }

    #[test]
    fn delete_removes_every_occurrence() {
        let mut params: QueryParams = "a=1&b=2&a=3".parse().unwrap();
        params.delete("a");
        assert_eq!(params.to_string(), "b=2");
        assert!(!params.contains("a"));
    }

    #[test]
    fn append_keeps_duplicates() {
        let mut params = QueryParams::new();
        params.append("a", "1");
        params.append("a", "2");
        assert_eq!(params.to_string(), "a=1&a=2");
    }

    #[test]
    fn rendering_encodes_values_again() {
        let params: QueryParams = [("range", "10%2C50")].into_iter().collect();
        assert_eq!(params.to_string(), "range=10%252C50");

        let reparsed: QueryParams = params.to_string().parse().unwrap();
        assert_eq!(reparsed, params);
    }

    #[test]
    fn iterates_in_order() {
        let params: QueryParams = "b=2&a=1".parse().unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
    }
}
