// ── Type coercion ──
//
// The status API mixes native JSON numbers and numeric-looking strings
// freely (`"lllp1": 3680` next to `"soc": "76.5"`). Every raw value is
// classified once, by a pure total function, into a tagged union.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// A classified metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Type tag of a [`MetricValue`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Float,
    Text,
}

impl MetricValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Classify a raw payload value. First matching rule wins:
///
/// 1. native JSON number: integer when it has no fractional part and fits
///    `i64`, float otherwise
/// 2. string of an optional sign and ASCII digits: integer (`"007"` is 7)
/// 3. string holding a finite decimal float (`"1e3"`, `"-0.5"`): float
/// 4. everything else is text, kept verbatim
pub fn coerce(raw: &Value) -> MetricValue {
    match raw {
        Value::Number(n) => coerce_number(n),
        Value::String(s) => coerce_str(s),
        Value::Bool(b) => MetricValue::Text(b.to_string()),
        Value::Null => MetricValue::Text("null".into()),
        nested @ (Value::Array(_) | Value::Object(_)) => MetricValue::Text(nested.to_string()),
    }
}

/// Classify a string value (rules 2 to 4 of [`coerce`]).
pub fn coerce_str(raw: &str) -> MetricValue {
    let trimmed = raw.trim();
    if let Some(i) = parse_integer(trimmed) {
        return MetricValue::Integer(i);
    }
    if let Some(f) = parse_float(trimmed) {
        return MetricValue::Float(f);
    }
    MetricValue::Text(raw.to_owned())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::as_conversions
)]
fn coerce_number(n: &serde_json::Number) -> MetricValue {
    if let Some(i) = n.as_i64() {
        return MetricValue::Integer(i);
    }
    if let Some(u) = n.as_u64() {
        // Beyond i64::MAX; no lossless integer representation left.
        return MetricValue::Float(u as f64);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            MetricValue::Integer(f as i64)
        }
        Some(f) => MetricValue::Float(f),
        None => MetricValue::Text(n.to_string()),
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    // `f64::from_str` also accepts "inf" and "NaN"; only plain decimal
    // notation counts as numeric here.
    let plain = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plain || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integer_strings() {
        assert_eq!(coerce(&json!("42")), MetricValue::Integer(42));
        assert_eq!(coerce(&json!("007")), MetricValue::Integer(7));
        assert_eq!(coerce(&json!("-5")), MetricValue::Integer(-5));
        assert_eq!(coerce(&json!("+12")), MetricValue::Integer(12));
    }

    #[test]
    fn float_strings() {
        let pi = coerce(&json!("3.14"));
        assert_eq!(pi.kind(), ValueKind::Float);
        assert_eq!(pi.to_string(), "3.14");
        assert_eq!(coerce(&json!("1e3")), MetricValue::Float(1000.0));
        assert_eq!(coerce(&json!("-0.5")), MetricValue::Float(-0.5));
        assert_eq!(coerce(&json!("76.5")).kind(), ValueKind::Float);
    }

    #[test]
    fn integer_overflow_falls_through_to_float() {
        let v = coerce(&json!("99999999999999999999"));
        assert_eq!(v.kind(), ValueKind::Float);
    }

    #[test]
    fn text_stays_text() {
        for raw in ["on", "", "true", "false", "none", "nan", "inf", "1.2.3", "-", "e"] {
            assert_eq!(
                coerce(&json!(raw)),
                MetricValue::Text(raw.to_owned()),
                "{raw:?} should stay text"
            );
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored_for_numbers_only() {
        assert_eq!(coerce(&json!(" 12 ")), MetricValue::Integer(12));
        assert_eq!(coerce(&json!(" on ")), MetricValue::Text(" on ".into()));
    }

    #[test]
    fn native_numbers() {
        assert_eq!(coerce(&json!(3680)), MetricValue::Integer(3680));
        assert_eq!(coerce(&json!(-12)), MetricValue::Integer(-12));
        assert_eq!(coerce(&json!(5.0)), MetricValue::Integer(5));
        assert_eq!(coerce(&json!(0.25)), MetricValue::Float(0.25));
        assert_eq!(coerce(&json!(u64::MAX)).kind(), ValueKind::Float);
    }

    #[test]
    fn non_scalar_values_become_text() {
        assert_eq!(coerce(&json!(true)), MetricValue::Text("true".into()));
        assert_eq!(coerce(&Value::Null), MetricValue::Text("null".into()));
        assert_eq!(
            coerce(&json!({"a": 1})),
            MetricValue::Text(r#"{"a":1}"#.into())
        );
        assert_eq!(coerce(&json!([1, 2])), MetricValue::Text("[1,2]".into()));
    }

    #[test]
    fn kind_round_trips_through_strum() {
        assert_eq!(ValueKind::Float.to_string(), "float");
        assert_eq!("text".parse::<ValueKind>().ok(), Some(ValueKind::Text));
    }
}
