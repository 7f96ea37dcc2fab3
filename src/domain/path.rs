use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;

/// The character joining nested object keys into a dotted path.
pub const SEPARATOR: char = '.';

/// A validated key for one level of a nested state object.
///
/// Segments are non-empty and never contain [`SEPARATOR`], so that joining
/// them into a [`DottedPath`] is reversible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment(NonEmptyString);

impl Segment {
    /// Creates a new `Segment` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSegmentError` if the string is empty or contains the
    /// path separator.
    pub fn new(s: String) -> Result<Self, InvalidSegmentError> {
        if s.contains(SEPARATOR) {
            return Err(InvalidSegmentError(s));
        }
        NonEmptyString::new(s).map(Self).map_err(InvalidSegmentError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Segment {
    type Error = InvalidSegmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Segment {
    type Error = InvalidSegmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Segment {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Segment {
    type Err = InvalidSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a key is empty or contains the path separator.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid key '{0}': must be non-empty and must not contain '.'")]
pub struct InvalidSegmentError(String);

impl InvalidSegmentError {
    /// The rejected key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0
    }
}

/// A path into a nested state object, e.g. `filters.minPrice`.
///
/// The dotted form doubles as the query-parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedPath(NonEmpty<Segment>);

impl DottedPath {
    /// A single-segment path.
    #[must_use]
    pub fn root(segment: Segment) -> Self {
        Self(NonEmpty::new(segment))
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Returns the segments as strings, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Segment::as_str)
    }

    /// The number of nesting levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The innermost key.
    #[must_use]
    pub fn leaf_key(&self) -> &str {
        self.0.last().as_str()
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.head)?;
        for segment in &self.0.tail {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for DottedPath {
    type Err = InvalidSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split(SEPARATOR).map(Segment::from_str);
        // `split` always yields at least one item
        let head = segments
            .next()
            .unwrap_or_else(|| Err(InvalidSegmentError(String::new())))?;
        let tail = segments.collect::<Result<Vec<_>, _>>()?;
        Ok(Self(NonEmpty { head, tail }))
    }
}

impl TryFrom<&str> for DottedPath {
    type Error = InvalidSegmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}
