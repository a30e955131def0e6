//! Per-feature observations and the runtime state derived from them.
//!
//! Every expression reads two feature-state fields, `value` and `valueAbs`,
//! which the rendering collaborator stores per feature id.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature-state field holding the raw observation.
pub const VALUE_FIELD: &str = "value";
/// Feature-state field holding the absolute value of the observation.
pub const VALUE_ABS_FIELD: &str = "valueAbs";
/// Feature-state field matched by polygon categorical styles.
pub const CATEGORY_FIELD: &str = "category";

/// Identifier addressing a feature within its geometry source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    /// Numeric id (rendering engines prefer these).
    Number(u64),
    /// String id.
    Text(String),
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        FeatureId::Number(id)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::Text(id.to_string())
    }
}

/// A single observation: numeric or categorical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    /// A numeric value.
    Number(f64),
    /// A text (category) value.
    Text(String),
}

impl Datum {
    /// Get as f64, or None if not a finite number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Datum::Number(n) => Value::from(*n),
            Datum::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Number(v)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

/// One observation per feature; `value` is `None` when the feature has no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    /// Feature id, unique within its source.
    pub id: FeatureId,
    /// Observed value.
    pub value: Option<Datum>,
}

impl FeatureValue {
    /// Create a feature value.
    #[must_use]
    pub fn new(id: impl Into<FeatureId>, value: impl Into<Datum>) -> Self {
        Self {
            id: id.into(),
            value: Some(value.into()),
        }
    }

    /// Create a feature with no observation.
    #[must_use]
    pub fn missing(id: impl Into<FeatureId>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }

    /// The feature-state map the rendering collaborator stores for this feature.
    ///
    /// Numeric observations set `value` and `valueAbs`; categorical ones set
    /// `value` and `category`. Missing observations set both to null so a
    /// previous state is cleared.
    #[must_use]
    pub fn runtime_state(&self) -> Map<String, Value> {
        let mut state = Map::new();
        match &self.value {
            Some(Datum::Number(n)) if n.is_finite() => {
                let value = Datum::Number(*n).to_json();
                let abs = Datum::Number(n.abs()).to_json();
                state.insert(VALUE_FIELD.to_string(), value);
                state.insert(VALUE_ABS_FIELD.to_string(), abs);
            }
            Some(datum @ Datum::Text(_)) => {
                state.insert(VALUE_FIELD.to_string(), datum.to_json());
                state.insert(CATEGORY_FIELD.to_string(), datum.to_json());
            }
            _ => {
                state.insert(VALUE_FIELD.to_string(), Value::Null);
                state.insert(VALUE_ABS_FIELD.to_string(), Value::Null);
            }
        }
        state
    }
}

/// Finite numeric observations, in input order.
pub(crate) fn numeric_values(values: &[FeatureValue]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|fv| fv.value.as_ref().and_then(Datum::as_f64))
        .collect()
}

/// A distinct categorical label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    /// Numeric label (e.g. 0/1 flags).
    Number(f64),
    /// Text label.
    Text(String),
}

impl Category {
    pub(crate) fn to_json(&self) -> Value {
        match self {
            Category::Number(n) => Value::from(*n),
            Category::Text(s) => Value::String(s.clone()),
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Category {}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numbers ascend before text; text sorts lexicographically.
impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Category::Number(a), Category::Number(b)) => a.total_cmp(b),
            (Category::Number(_), Category::Text(_)) => Ordering::Less,
            (Category::Text(_), Category::Number(_)) => Ordering::Greater,
            (Category::Text(a), Category::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Number(n) => write!(f, "{n}"),
            Category::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Datum> for Category {
    fn from(datum: &Datum) -> Self {
        match datum {
            Datum::Number(n) => Category::Number(*n),
            Datum::Text(s) => Category::Text(s.clone()),
        }
    }
}

impl From<f64> for Category {
    fn from(v: f64) -> Self {
        Category::Number(v)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::Text(s.to_string())
    }
}

/// Classification output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bins {
    /// Ordered breakpoints for continuous and diverging styles.
    Breaks(Vec<f64>),
    /// Distinct category labels, in observation order.
    Categories(Vec<Category>),
}

impl Bins {
    /// Number of breakpoints or categories.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Bins::Breaks(b) => b.len(),
            Bins::Categories(c) => c.len(),
        }
    }

    /// True when classification found no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Breakpoints, if this is a numeric classification.
    #[must_use]
    pub fn breaks(&self) -> Option<&[f64]> {
        match self {
            Bins::Breaks(b) => Some(b),
            Bins::Categories(_) => None,
        }
    }

    /// Categories, if this is a categorical classification.
    #[must_use]
    pub fn categories(&self) -> Option<&[Category]> {
        match self {
            Bins::Breaks(_) => None,
            Bins::Categories(c) => Some(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_state_numeric() {
        let state = FeatureValue::new(7, -12.5).runtime_state();
        assert_eq!(state[VALUE_FIELD], serde_json::json!(-12.5));
        assert_eq!(state[VALUE_ABS_FIELD], serde_json::json!(12.5));
    }

    #[test]
    fn test_runtime_state_missing() {
        let state = FeatureValue::missing("a").runtime_state();
        assert!(state[VALUE_FIELD].is_null());
        assert!(state[VALUE_ABS_FIELD].is_null());
    }

    #[test]
    fn test_runtime_state_category() {
        let state = FeatureValue::new(1, "rail").runtime_state();
        assert_eq!(state[CATEGORY_FIELD], serde_json::json!("rail"));
        assert!(!state.contains_key(VALUE_ABS_FIELD));
    }

    #[test]
    fn test_numeric_values_skip_missing_and_text() {
        let values = vec![
            FeatureValue::new(1, 3.0),
            FeatureValue::missing(2),
            FeatureValue::new(3, "x"),
            FeatureValue::new(4, f64::NAN),
        ];
        assert_eq!(numeric_values(&values), vec![3.0]);
    }

    #[test]
    fn test_category_ordering() {
        let mut cats = vec![
            Category::from("b"),
            Category::from(2.0),
            Category::from("a"),
            Category::from(1.0),
        ];
        cats.sort();
        let expected = vec![
            Category::from(1.0),
            Category::from(2.0),
            Category::from("a"),
            Category::from("b"),
        ];
        assert_eq!(cats, expected);
    }

    #[test]
    fn test_deserialize_feature_values() {
        let json = r#"[{"id":1,"value":0},{"id":"x","value":"rail"},{"id":3,"value":null}]"#;
        let values: Vec<FeatureValue> = serde_json::from_str(json).unwrap();
        assert_eq!(values[0].value, Some(Datum::Number(0.0)));
        assert_eq!(values[1].id, FeatureId::Text("x".to_string()));
        assert_eq!(values[2].value, None);
    }

    #[test]
    fn test_bins_accessors() {
        let bins = Bins::Breaks(vec![0.0, 1.0]);
        assert_eq!(bins.len(), 2);
        assert!(bins.categories().is_none());
        assert!(Bins::Categories(vec![]).is_empty());
    }
}
