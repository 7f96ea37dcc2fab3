//! Leaf values: the atomic unit stored under a dotted path.

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Serialize, Serializer};

/// A single non-list value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A string.
    Text(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// An instant, held at millisecond precision.
    Date(DateTime<Utc>),
}

impl Scalar {
    /// Creates a date scalar, truncated to millisecond precision.
    #[must_use]
    pub fn date(instant: DateTime<Utc>) -> Self {
        Self::Date(instant.trunc_subsecs(3))
    }

    /// The kind of this scalar.
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::Text(_) => ScalarKind::Text,
            Self::Number(_) => ScalarKind::Number,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Date(_) => ScalarKind::Date,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => f.write_str(&number_to_string(*number)),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Date(instant) => f.write_str(&iso_string(instant)),
        }
    }
}

/// A value stored at one dotted path.
///
/// Lists are homogeneous: every element has the same [`ScalarKind`]. This is
/// checked when a schema is built, not when a `Leaf` is constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// An explicit absence of a value.
    Null,
    /// A string.
    Text(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// An instant, held at millisecond precision.
    Date(DateTime<Utc>),
    /// A homogeneous list of scalars.
    List(Vec<Scalar>),
}

impl Leaf {
    /// Creates a date leaf, truncated to millisecond precision.
    #[must_use]
    pub fn date(instant: DateTime<Utc>) -> Self {
        Self::Date(instant.trunc_subsecs(3))
    }

    /// Creates a list leaf from anything convertible to scalars.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns `true` for [`Leaf::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for a null leaf or an empty list.
    ///
    /// Empty defaults are left out of the baseline query string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The scalar form of this leaf, if it is neither null nor a list.
    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Text(text) => Some(Scalar::Text(text.clone())),
            Self::Number(number) => Some(Scalar::Number(*number)),
            Self::Bool(flag) => Some(Scalar::Bool(*flag)),
            Self::Date(instant) => Some(Scalar::Date(*instant)),
            Self::Null | Self::List(_) => None,
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => f.write_str(&number_to_string(*number)),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Date(instant) => f.write_str(&iso_string(instant)),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<Scalar> for Leaf {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => Self::Text(text),
            Scalar::Number(number) => Self::Number(number),
            Scalar::Bool(flag) => Self::Bool(flag),
            Scalar::Date(instant) => Self::Date(instant),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => |$value:ident| $scalar:expr),* $(,)?) => {
        $(
            impl From<$source> for Scalar {
                fn from($value: $source) -> Self {
                    $scalar
                }
            }

            impl From<$source> for Leaf {
                fn from(value: $source) -> Self {
                    Scalar::from(value).into()
                }
            }
        )*
    };
}

impl_from! {
    String => |value| Self::Text(value),
    &str => |value| Self::Text(value.to_string()),
    f64 => |value| Self::Number(value),
    i32 => |value| Self::Number(f64::from(value)),
    u32 => |value| Self::Number(f64::from(value)),
    bool => |value| Self::Bool(value),
    DateTime<Utc> => |value| Self::date(value),
}

impl<T: Into<Scalar>> From<Vec<T>> for Leaf {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(number) => serialize_number(*number, serializer),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Date(instant) => serializer.serialize_str(&iso_string(instant)),
        }
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::List(items) => serializer.collect_seq(items),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(number) => serialize_number(*number, serializer),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Date(instant) => serializer.serialize_str(&iso_string(instant)),
        }
    }
}

/// Largest magnitude below which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// The number as an `i64`, if it is integral and exactly representable.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn safe_integer(number: f64) -> Option<i64> {
    (number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER).then_some(number as i64)
}

/// Integral numbers are written as integers, the way `JSON.stringify` does.
fn serialize_number<S: Serializer>(number: f64, serializer: S) -> Result<S::Ok, S::Error> {
    match safe_integer(number) {
        Some(integer) => serializer.serialize_i64(integer),
        None => serializer.serialize_f64(number),
    }
}

/// The type of a scalar, as declared by a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Strings.
    Text,
    /// Numbers.
    Number,
    /// Booleans.
    Bool,
    /// Dates.
    Date,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Date => "date",
        })
    }
}

/// The type of a leaf, as declared by a default value.
///
/// This is the explicit tag the codec dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A null default. Present values decode as text.
    Null,
    /// A scalar of the given kind.
    Scalar(ScalarKind),
    /// A homogeneous list of the given element kind.
    List(ScalarKind),
}

impl Kind {
    /// Infers the kind declared by a default value.
    ///
    /// A list's element kind is taken from its first element, falling back
    /// to text for an empty list.
    #[must_use]
    pub fn of(default: &Leaf) -> Self {
        match default {
            Leaf::Null => Self::Null,
            Leaf::Text(_) => Self::Scalar(ScalarKind::Text),
            Leaf::Number(_) => Self::Scalar(ScalarKind::Number),
            Leaf::Bool(_) => Self::Scalar(ScalarKind::Bool),
            Leaf::Date(_) => Self::Scalar(ScalarKind::Date),
            Leaf::List(items) => {
                Self::List(items.first().map_or(ScalarKind::Text, Scalar::kind))
            }
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::List(kind) => write!(f, "array<{kind}>"),
        }
    }
}

/// Formats an instant as ISO-8601 with milliseconds and a `Z` suffix.
#[must_use]
pub fn iso_string(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a number the way `String(n)` does in a browser.
///
/// Integral values carry no fractional part; very large and very small
/// magnitudes switch to exponent notation with an explicit sign.
#[must_use]
pub fn number_to_string(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if number == 0.0 {
        return "0".to_string();
    }
    let magnitude = number.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return number.to_string();
    }
    let exponential = format!("{number:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponential,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    #[test_case(3.0, "3"; "integer")]
    #[test_case(-42.0, "-42"; "negative integer")]
    #[test_case(0.5, "0.5"; "fraction")]
    #[test_case(-0.0, "0"; "negative zero")]
    #[test_case(1e21, "1e+21"; "large exponent")]
    #[test_case(1.5e-7, "1.5e-7"; "small exponent")]
    #[test_case(123_456_789.0, "123456789"; "large integer")]
    #[test_case(f64::NAN, "NaN"; "nan")]
    #[test_case(f64::INFINITY, "Infinity"; "infinity")]
    #[test_case(f64::NEG_INFINITY, "-Infinity"; "negative infinity")]
    fn numbers_format_like_a_browser(number: f64, expected: &str) {
        assert_eq!(number_to_string(number), expected);
    }

    #[test]
    fn dates_format_as_iso_with_millis() {
        let instant = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Leaf::date(instant).to_string(), "2020-01-01T00:00:00.000Z");
    }

    #[test]
    fn date_constructor_truncates_to_millis() {
        let instant = Utc.timestamp_nanos(1_577_836_800_123_456_789);
        let Leaf::Date(stored) = Leaf::date(instant) else {
            panic!("expected a date");
        };
        assert_eq!(stored.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn list_string_form_joins_with_commas() {
        let leaf = Leaf::list([10, 50]);
        assert_eq!(leaf.to_string(), "10,50");
        assert_eq!(Leaf::list(Vec::<String>::new()).to_string(), "");
    }

    #[test]
    fn null_string_form() {
        assert_eq!(Leaf::Null.to_string(), "null");
    }

    #[test_case(Leaf::from(1), Kind::Scalar(ScalarKind::Number); "number")]
    #[test_case(Leaf::from("x"), Kind::Scalar(ScalarKind::Text); "text")]
    #[test_case(Leaf::from(true), Kind::Scalar(ScalarKind::Bool); "bool")]
    #[test_case(Leaf::Null, Kind::Null; "null")]
    #[test_case(Leaf::list([0, 100]), Kind::List(ScalarKind::Number); "number list")]
    #[test_case(Leaf::List(Vec::new()), Kind::List(ScalarKind::Text); "empty list")]
    fn kind_is_inferred_from_default(default: Leaf, expected: Kind) {
        assert_eq!(Kind::of(&default), expected);
    }

    #[test]
    fn kind_display() {
        assert_eq!(Kind::List(ScalarKind::Date).to_string(), "array<date>");
        assert_eq!(Kind::Scalar(ScalarKind::Bool).to_string(), "boolean");
    }

    #[test]
    fn empty_defaults() {
        assert!(Leaf::Null.is_empty());
        assert!(Leaf::List(Vec::new()).is_empty());
        assert!(!Leaf::from("").is_empty());
        assert!(!Leaf::list([1]).is_empty());
    }

    #[test]
    fn serializes_to_json() {
        let leaf = Leaf::list([1, 2]);
        assert_eq!(serde_json::to_string(&leaf).unwrap(), "[1,2]");
        assert_eq!(serde_json::to_string(&Leaf::Null).unwrap(), "null");
    }

    #[test_case(1.0, "1"; "integral")]
    #[test_case(-0.0, "0"; "negative zero")]
    #[test_case(2.5, "2.5"; "fraction")]
    #[test_case(1e300, "1e300"; "beyond safe range")]
    #[test_case(f64::NAN, "null"; "nan")]
    #[test_case(f64::INFINITY, "null"; "infinity")]
    fn numbers_serialize_like_json_stringify(number: f64, expected: &str) {
        assert_eq!(serde_json::to_string(&Leaf::Number(number)).unwrap(), expected);
    }
}
