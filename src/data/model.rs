use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldValue – a single cell of an observation
// ---------------------------------------------------------------------------

/// A dynamically-typed observation value. Serializes as a bare JSON scalar
/// so rows round-trip through the service unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, ""),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl FieldValue {
    /// Coerce raw user or file input: finite numbers become `Number`,
    /// blank input becomes `Null`, anything else stays text.
    pub fn coerce(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return FieldValue::Null;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => FieldValue::Number(v),
            _ => FieldValue::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Whether the value counts as "filled in" for required-field checks.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Number(v) => v.is_finite(),
            FieldValue::Bool(_) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the dataset
// ---------------------------------------------------------------------------

/// Field key → value. Keys normally come from the active model profile, but
/// analysis results add extra keys such as `classification`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation {
    fields: BTreeMap<String, FieldValue>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// True when `key` exists and holds a non-empty value.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::is_present)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Observation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Observation {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numbers_text_and_blank() {
        assert_eq!(FieldValue::coerce(" 1.5 "), FieldValue::Number(1.5));
        assert_eq!(FieldValue::coerce("-3"), FieldValue::Number(-3.0));
        assert_eq!(FieldValue::coerce("K00752.01"), FieldValue::Text("K00752.01".into()));
        assert_eq!(FieldValue::coerce("NaN"), FieldValue::Text("NaN".into()));
        assert_eq!(FieldValue::coerce("   "), FieldValue::Null);
    }

    #[test]
    fn observation_serializes_as_flat_object() {
        let obs: Observation = [
            ("koi_period", FieldValue::Number(9.5)),
            ("kepoi_name", FieldValue::Text("K1".into())),
            ("koi_score", FieldValue::Null),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(json, r#"{"kepoi_name":"K1","koi_period":9.5,"koi_score":null}"#);

        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }

    #[test]
    fn integers_deserialize_as_numbers() {
        let obs: Observation = serde_json::from_str(r#"{"classification": 3, "flag": true}"#).unwrap();
        assert_eq!(obs.number("classification"), Some(3.0));
        assert_eq!(obs.get("flag"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn presence_rules() {
        let mut obs = Observation::new();
        obs.insert("a", 1.0);
        obs.insert("b", "  ");
        obs.insert("c", FieldValue::Null);
        assert!(obs.has_value("a"));
        assert!(!obs.has_value("b"));
        assert!(!obs.has_value("c"));
        assert!(!obs.has_value("d"));
    }
}
