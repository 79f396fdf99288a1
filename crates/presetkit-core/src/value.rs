//! Parameter values as they appear in schema defaults and preset documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parameter value.
///
/// Serialized untagged, so JSON `1` is [`Value::Int`], `0.5` is
/// [`Value::Float`], `true` is [`Value::Bool`] and anything quoted is
/// [`Value::Text`]. Text values appear only in schema defaults whose
/// expression is not a plain literal (e.g. `Scales::gain.invmap(1.0)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Opaque expression text.
    Text(String),
}

impl Value {
    /// Parse a literal the way default expressions are interpreted.
    ///
    /// Tries an integer, then a float, then `true`/`false`, and otherwise keeps
    /// the trimmed text. Parsing never depends on locale; the decimal point is
    /// always `.`.
    ///
    /// ```rust
    /// use presetkit_core::Value;
    ///
    /// assert_eq!(Value::parse_literal("3"), Value::Int(3));
    /// assert_eq!(Value::parse_literal("0.25"), Value::Float(0.25));
    /// assert_eq!(Value::parse_literal("false"), Value::Bool(false));
    /// assert_eq!(
    ///     Value::parse_literal("Scales::gain.invmap(0.5)"),
    ///     Value::Text("Scales::gain.invmap(0.5)".to_string())
    /// );
    /// ```
    pub fn parse_literal(text: &str) -> Self {
        let text = text.trim();
        if let Ok(v) = text.parse::<i64>() {
            return Value::Int(v);
        }
        // `f64::from_str` also accepts "inf" and "nan", which are identifiers here.
        if text.bytes().any(|b| b.is_ascii_digit())
            && let Ok(v) = text.parse::<f64>()
            && v.is_finite()
        {
            return Value::Float(v);
        }
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(text.to_string()),
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Text(_) => None,
        }
    }

    /// Integer view of the value. Floats qualify only when they are integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Formats the value as a source-level literal.
    ///
    /// Floats always keep a decimal point or exponent so generated code never
    /// turns a normalized value into an integer literal by accident.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
