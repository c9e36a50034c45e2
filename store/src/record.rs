// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Record and field value types.
//!
//! A record is a flat mapping from field name to a scalar or list value,
//! mirroring the JSON objects the simulated vendor APIs store. Absence of a
//! field is expressed by the key not being present; the query engine treats
//! absent fields as non-matching rather than erroring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single field value. The set of kinds is closed on purpose: the
/// evaluator's coercion rules are exhaustive over these variants.
///
/// Serialized untagged, so a record round-trips as a plain JSON object:
/// `{"title": "Q3 report", "trashed": false, "parents": ["root"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// True for the empty string and the empty list. Used by the
    /// `EMPTY`/`NULL` operators together with field absence.
    pub fn is_empty_value(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.is_empty(),
            FieldValue::List(values) => values.is_empty(),
            _ => false,
        }
    }

    /// Render the value as text for containment and equality checks.
    /// Numbers drop a trailing `.0` so `5.0` compares equal to `"5"`.
    pub fn to_display_string(&self) -> String {
        match self {
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Number(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            FieldValue::Text(value) => value.clone(),
            FieldValue::List(values) => values.join(","),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

/// A record is an ordered field map. Ordering keeps serialized state files
/// diffable; the engine itself never depends on field order.
pub type Record = BTreeMap<String, FieldValue>;

/// Build a record from `(field, value)` pairs. Convenience for tests and
/// seeding fixtures.
pub fn record<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shape() {
        let rec = record([
            ("title", FieldValue::from("Q3 report")),
            ("trashed", FieldValue::from(false)),
            ("size", FieldValue::from(42.0)),
            ("parents", FieldValue::from(vec!["root".to_string()])),
        ]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"parents":["root"],"size":42.0,"title":"Q3 report","trashed":false}"#
        );

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_display_string_drops_integral_fraction() {
        assert_eq!(FieldValue::Number(5.0).to_display_string(), "5");
        assert_eq!(FieldValue::Number(5.5).to_display_string(), "5.5");
    }
}
