//! Conversion between typed leaves and query-parameter values.
//!
//! Decoding is lenient: a raw value that cannot be coerced to the field's
//! declared kind yields the field default, never an error. Encoding
//! percent-encodes the value's string form; lists are joined with `,` first.
//!
//! Lists have no escaping for the separator, so a list element whose string
//! form contains `,` does not survive a round trip.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{
    leaf::{Kind, Leaf, Scalar, ScalarKind},
    schema::Field,
};

/// Separates list elements inside a parameter value.
pub const LIST_SEPARATOR: char = ',';

/// Decodes a raw query-parameter value against a field.
///
/// `None` (parameter absent) yields the default. The raw value is
/// percent-decoded once before coercion; see [`coerce`] for the rules.
#[must_use]
pub fn parse_value(raw: Option<&str>, field: &Field) -> Leaf {
    let Some(raw) = raw else {
        return field.default().clone();
    };
    match decode_component(raw) {
        Some(decoded) => coerce(&decoded, field),
        None => field.default().clone(),
    }
}

/// Coerces already-decoded text to a field's kind.
///
/// * lists: empty text yields the default; otherwise the text is split on
///   `,` and each element is coerced to the element kind, falling back to
///   the first default element
/// * dates: parsed as a date string, falling back to the default
/// * numbers: parsed with browser `Number()` rules, falling back to the
///   default
/// * booleans: `true` only for the exact text `"true"`
/// * strings and null defaults: the text itself
#[must_use]
pub fn coerce(text: &str, field: &Field) -> Leaf {
    match field.kind() {
        Kind::List(element) => {
            if text.is_empty() {
                return field.default().clone();
            }
            let fallback = field.element_default();
            Leaf::List(
                text.split(LIST_SEPARATOR)
                    .map(|part| {
                        coerce_scalar(part, element)
                            .or_else(|| fallback.as_scalar())
                            .unwrap_or_else(|| Scalar::Text(part.to_string()))
                    })
                    .collect(),
            )
        }
        Kind::Scalar(kind) => {
            coerce_scalar(text, kind).map_or_else(|| field.default().clone(), Leaf::from)
        }
        Kind::Null => Leaf::Text(text.to_string()),
    }
}

fn coerce_scalar(text: &str, kind: ScalarKind) -> Option<Scalar> {
    match kind {
        ScalarKind::Text => Some(Scalar::Text(text.to_string())),
        ScalarKind::Bool => Some(Scalar::Bool(text == "true")),
        ScalarKind::Number => parse_number(text).map(Scalar::Number),
        ScalarKind::Date => parse_date(text).map(Scalar::date),
    }
}

/// Encodes a leaf as a query-parameter value.
///
/// The value's string form (lists joined with `,`, dates as ISO-8601 with
/// milliseconds) is percent-encoded as a whole.
#[must_use]
pub fn serialize_value(value: &Leaf) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

/// Compares two leaves the way the reconciler decides "equal to default".
///
/// Lists compare element-wise and must have the same length, dates compare by
/// millisecond timestamp, and everything else compares by string form, so
/// the number `5` equals the text `"5"`.
#[must_use]
pub fn is_equal(a: &Leaf, b: &Leaf) -> bool {
    match (a, b) {
        (Leaf::List(left), Leaf::List(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| scalars_equal(left, right))
        }
        (Leaf::Date(left), Leaf::Date(right)) => {
            left.timestamp_millis() == right.timestamp_millis()
        }
        _ => a.to_string() == b.to_string(),
    }
}

fn scalars_equal(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Date(left), Scalar::Date(right)) => {
            left.timestamp_millis() == right.timestamp_millis()
        }
        _ => a.to_string() == b.to_string(),
    }
}

/// Percent-decodes one query component.
///
/// Returns `None` if the decoded bytes are not UTF-8.
fn decode_component(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}

/// Parses a number with the rules of the browser's `Number()` conversion.
///
/// Surrounding whitespace is ignored and blank text is zero. `Infinity` and
/// the `0x`, `0o` and `0b` integer prefixes are accepted; anything that would
/// produce `NaN` returns `None`.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if let Some(value) = parse_radix_integer(trimmed) {
        return value;
    }
    // Rust accepts spellings such as "inf" and "NaN" that `Number()` does not.
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// `Some(None)` means the prefix matched but the digits were invalid.
#[allow(clippy::option_option, clippy::cast_precision_loss)]
fn parse_radix_integer(text: &str) -> Option<Option<f64>> {
    let mut chars = text.chars();
    if chars.next() != Some('0') {
        return None;
    }
    let radix = match chars.next() {
        Some('x' | 'X') => 16,
        Some('o' | 'O') => 8,
        Some('b' | 'B') => 2,
        _ => return None,
    };
    let digits = &text[2..];
    Some(
        u128::from_str_radix(digits, radix)
            .ok()
            .filter(|_| !digits.starts_with('+'))
            .map(|value| value as f64),
    )
}

/// Parses a date string.
///
/// Accepts RFC 3339 / ISO-8601 instants, RFC 2822 dates, ISO date-times
/// without an offset, bare `YYYY-MM-DD` dates, `YYYY-MM` months and `YYYY`
/// years. Date-times without an offset are read as UTC.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    let padded = if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        format!("{text}-01-01")
    } else {
        format!("{text}-01")
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    fn field(default: impl Into<Leaf>) -> Field {
        Field::new(default.into())
    }

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn absent_yields_default() {
        assert_eq!(parse_value(None, &field(7)), Leaf::from(7));
        assert_eq!(parse_value(None, &field(Leaf::Null)), Leaf::Null);
    }

    #[test_case("42", 42.0; "integer")]
    #[test_case("-1.5", -1.5; "negative fraction")]
    #[test_case("  8 ", 8.0; "whitespace")]
    #[test_case("", 0.0; "blank is zero")]
    #[test_case("1e3", 1000.0; "exponent")]
    #[test_case("0x1F", 31.0; "hex")]
    #[test_case("0b101", 5.0; "binary")]
    #[test_case("abc", 7.0; "garbage falls back")]
    #[test_case("NaN", 7.0; "nan falls back")]
    #[test_case("inf", 7.0; "rust spelling falls back")]
    #[test_case("0xZZ", 7.0; "bad hex falls back")]
    fn numbers_decode_leniently(raw: &str, expected: f64) {
        assert_eq!(parse_value(Some(raw), &field(7)), Leaf::Number(expected));
    }

    #[test]
    fn infinity_decodes() {
        assert_eq!(
            parse_value(Some("-Infinity"), &field(0)),
            Leaf::Number(f64::NEG_INFINITY)
        );
    }

    #[test_case("true", true; "exact true")]
    #[test_case("false", false; "false")]
    #[test_case("1", false; "one is false")]
    #[test_case("TRUE", false; "case sensitive")]
    #[test_case("", false; "blank is false")]
    fn booleans_are_true_only_for_true(raw: &str, expected: bool) {
        assert_eq!(parse_value(Some(raw), &field(true)), Leaf::Bool(expected));
    }

    #[test]
    fn strings_are_percent_decoded() {
        assert_eq!(
            parse_value(Some("hello%20world"), &field("x")),
            Leaf::from("hello world")
        );
        assert_eq!(parse_value(Some(""), &field("x")), Leaf::from(""));
    }

    #[test]
    fn null_default_decodes_as_text() {
        assert_eq!(parse_value(Some("abc"), &field(Leaf::Null)), Leaf::from("abc"));
    }

    #[test_case("2020-06-15T12:30:00.000Z", Utc.with_ymd_and_hms(2020, 6, 15, 12, 30, 0).unwrap(); "iso")]
    #[test_case("2020-06-15T12%3A30%3A00.000Z", Utc.with_ymd_and_hms(2020, 6, 15, 12, 30, 0).unwrap(); "encoded iso")]
    #[test_case("2020-06-15", Utc.with_ymd_and_hms(2020, 6, 15, 0, 0, 0).unwrap(); "date only")]
    #[test_case("2020-06", Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(); "month only")]
    #[test_case("2020", Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(); "year only")]
    #[test_case("2020-06-15T14:30:00+02:00", Utc.with_ymd_and_hms(2020, 6, 15, 12, 30, 0).unwrap(); "offset")]
    #[test_case("Mon, 15 Jun 2020 12:30:00 +0000", Utc.with_ymd_and_hms(2020, 6, 15, 12, 30, 0).unwrap(); "rfc2822")]
    fn dates_decode(raw: &str, expected: DateTime<Utc>) {
        assert_eq!(parse_value(Some(raw), &field(new_year())), Leaf::Date(expected));
    }

    #[test_case("not-a-date"; "garbage")]
    #[test_case("2020-13-45"; "out of range")]
    #[test_case("20201"; "five digit year")]
    fn malformed_dates_fall_back(raw: &str) {
        assert_eq!(
            parse_value(Some(raw), &field(new_year())),
            Leaf::Date(new_year())
        );
    }

    #[test]
    fn number_list_decodes_to_numbers() {
        let range = field(Leaf::list([0, 100]));
        assert_eq!(
            parse_value(Some("10%2C50"), &range),
            Leaf::list([10, 50])
        );
    }

    #[test]
    fn empty_list_default_decodes_as_text() {
        let tags = field(Leaf::List(Vec::new()));
        assert_eq!(parse_value(Some("a%2Cb"), &tags), Leaf::list(["a", "b"]));
        assert_eq!(parse_value(Some(""), &tags), Leaf::List(Vec::new()));
    }

    #[test]
    fn bad_list_elements_take_the_element_default() {
        let range = field(Leaf::list([0, 100]));
        assert_eq!(parse_value(Some("5,x"), &range), Leaf::list([5, 0]));
    }

    #[test]
    fn invalid_utf8_falls_back() {
        assert_eq!(parse_value(Some("%FF%FE"), &field("x")), Leaf::from("x"));
    }

    #[test]
    fn serialize_percent_encodes() {
        assert_eq!(serialize_value(&Leaf::list([10, 50])), "10%2C50");
        assert_eq!(serialize_value(&Leaf::from("a b&c")), "a%20b%26c");
        assert_eq!(serialize_value(&Leaf::from(3)), "3");
        assert_eq!(serialize_value(&Leaf::from(false)), "false");
        assert_eq!(
            serialize_value(&Leaf::date(new_year())),
            "2020-01-01T00%3A00%3A00.000Z"
        );
    }

    #[test_case(Leaf::from(3); "number")]
    #[test_case(Leaf::from(-0.25); "fraction")]
    #[test_case(Leaf::from("caf\u{e9} & more"); "text")]
    #[test_case(Leaf::from(true); "true")]
    #[test_case(Leaf::from(false); "false")]
    #[test_case(Leaf::date(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()); "date")]
    #[test_case(Leaf::list([1, 2, 3]); "number list")]
    #[test_case(Leaf::list(["a", "b c"]); "text list")]
    #[test_case(Leaf::list([true, false]); "bool list")]
    fn values_round_trip(value: Leaf) {
        let decoded = parse_value(Some(&serialize_value(&value)), &Field::new(value.clone()));
        assert!(is_equal(&decoded, &value), "{decoded:?} != {value:?}");
    }

    #[test]
    fn commas_inside_list_elements_do_not_round_trip() {
        let value = Leaf::list(["a,b"]);
        let decoded = parse_value(Some(&serialize_value(&value)), &Field::new(value.clone()));
        assert_eq!(decoded, Leaf::list(["a", "b"]));
    }

    #[test]
    fn equality_uses_string_form() {
        assert!(is_equal(&Leaf::from(5), &Leaf::from("5")));
        assert!(!is_equal(&Leaf::from(5), &Leaf::from(6)));
        assert!(is_equal(&Leaf::Null, &Leaf::from("null")));
    }

    #[test]
    fn list_equality_is_element_wise() {
        assert!(is_equal(&Leaf::list([1, 2]), &Leaf::list(["1", "2"])));
        assert!(!is_equal(&Leaf::list([1, 2]), &Leaf::list([1])));
        assert!(is_equal(&Leaf::List(Vec::new()), &Leaf::List(Vec::new())));
    }

    #[test]
    fn date_equality_uses_millis() {
        let a = Leaf::Date(Utc.timestamp_nanos(1_000_000_100));
        let b = Leaf::Date(Utc.timestamp_nanos(1_000_000_900));
        assert!(is_equal(&a, &b));
    }
}
