//! Dynamic values for widget models and message payloads.

use std::{collections::BTreeMap, fmt};

use serde_json::{Number as JsonNumber, Value as JsonValue};

/// Canonical dynamic representation for model fields, action arguments and
/// message payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    Str(String),
    /// Array value.
    List(Vec<Self>),
    /// Map value.
    Map(BTreeMap<String, Self>),
}

impl Value {
    /// Human-readable variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Str(_) => "Str",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
        }
    }

    /// Truthiness under the markup contract: null, false, zero, and empty
    /// strings/collections are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Strings parse leniently, the way markup
    /// attribute values are consumed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view of the value, truncating floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i64),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert to a serde_json value for diagnostics.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => JsonNumber::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Self::Str(s) => JsonValue::String(s.clone()),
            Self::List(l) => JsonValue::Array(l.iter().map(Self::to_json).collect()),
            Self::Map(m) => JsonValue::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Convert from a serde_json value.
    pub fn from_json(v: &JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Self::Str(s.clone()),
            JsonValue::Array(l) => Self::List(l.iter().map(Self::from_json).collect()),
            JsonValue::Object(m) => Self::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            v => write!(f, "{}", v.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("updates".into()).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(Value::Str("25".into()).as_f64(), Some(25.0));
        assert_eq!(Value::Str(" 25 ".into()).as_i64(), Some(25));
        assert_eq!(Value::Str("nope".into()).as_f64(), None);
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    }

    #[test]
    fn json_round_trip() {
        let v = Value::Map(
            [
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::List(vec![Value::Bool(true)])),
            ]
            .into(),
        );
        assert_eq!(Value::from_json(&v.to_json()), v);
    }
}
