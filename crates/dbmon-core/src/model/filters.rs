// ── Grid filters ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single filter form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Text(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// Empty text and empty lists carry no constraint.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flag(_) => false,
            Self::Text(s) => s.trim().is_empty(),
            Self::Many(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// Filter key → value, replaced wholesale on every apply.
pub type Filters = BTreeMap<String, FilterValue>;

/// Render filters as query pairs, skipping empty values.
///
/// List values repeat their key once per element.
pub fn to_query(filters: &Filters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in filters {
        match value {
            FilterValue::Flag(b) => pairs.push((key.clone(), b.to_string())),
            FilterValue::Text(s) => {
                let s = s.trim();
                if !s.is_empty() {
                    pairs.push((key.clone(), s.to_owned()));
                }
            }
            FilterValue::Many(values) => pairs.extend(
                values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.clone(), v.to_owned())),
            ),
        }
    }
    pairs
}
