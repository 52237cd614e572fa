//! Per-instance state bags.

use std::collections::BTreeMap;

use crate::value::Value;

/// A widget's mutable state: a flat bag of named [`Value`]s, seeded from the
/// descriptor's defaults and from markup attributes at instantiation time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    /// Stored fields.
    fields: BTreeMap<String, Value>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration, used for descriptor defaults.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field, returning the previous value if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Does the model contain the field?
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// String view of a field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Numeric view of a field, with lenient string parsing.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Integer view of a field.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Truthiness of a field; absent fields are falsy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(Value::is_truthy)
    }

    /// Overlay every field from `other` onto this model. Used when an
    /// extension's defaults are layered over its base's.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Is the model empty?
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_basics() {
        let mut m = Model::new().with("width", 0).with("channel", "volume");
        assert_eq!(m.get_f64("width"), Some(0.0));
        assert_eq!(m.get_str("channel"), Some("volume"));
        assert!(!m.is_truthy("width"));
        assert!(!m.is_truthy("link"));
        m.set("link", "volume");
        assert!(m.is_truthy("link"));
    }

    #[test]
    fn merge_overlays() {
        let mut base = Model::new().with("position", 0).with("percent", 0);
        let ext = Model::new().with("percent", 50).with("extra", true);
        base.merge(&ext);
        assert_eq!(base.get_i64("percent"), Some(50));
        assert!(base.is_truthy("extra"));
        assert_eq!(base.len(), 3);
    }
}
