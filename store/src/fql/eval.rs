// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQL expression evaluation against single records.
//!
//! Evaluation is permissive: an absent field, an incomparable type, or an
//! unparseable date makes the condition false instead of raising. Only the
//! postfix `EMPTY`/`NULL` operators match an absent field.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::ast::{Expression, Operator, Value};
use crate::record::{FieldValue, Record};

/// Evaluation knobs supplied by the caller alongside the record set.
#[derive(Debug, Clone, Default)]
pub struct EvalPolicy {
    /// Fields whose relational comparisons parse both sides as dates.
    /// Matched case-insensitively against the condition's field name.
    date_fields: HashSet<String>,
    /// Substring operators ignore case, mirroring Jira's `~`.
    case_insensitive_contains: bool,
}

impl EvalPolicy {
    pub fn new() -> Self {
        EvalPolicy::default()
    }

    /// Mark fields as date-like for `<`, `<=`, `>`, `>=` and sorting.
    pub fn date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields
            .into_iter()
            .map(|field| field.into().to_lowercase())
            .collect();
        self
    }

    pub fn case_insensitive_contains(mut self, enabled: bool) -> Self {
        self.case_insensitive_contains = enabled;
        self
    }

    pub(crate) fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.contains(&field.to_lowercase())
    }
}

/// Evaluate an expression tree against one record.
pub fn evaluate(expr: &Expression, record: &Record, policy: &EvalPolicy) -> bool {
    match expr {
        Expression::MatchAll => true,
        Expression::And { left, right } => {
            evaluate(left, record, policy) && evaluate(right, record, policy)
        }
        Expression::Or { left, right } => {
            evaluate(left, record, policy) || evaluate(right, record, policy)
        }
        Expression::Not { inner } => !evaluate(inner, record, policy),
        Expression::Comparison {
            field,
            operator,
            value,
        } => evaluate_comparison(field, *operator, value, record, policy),
    }
}

fn evaluate_comparison(
    field: &str,
    operator: Operator,
    value: &Value,
    record: &Record,
    policy: &EvalPolicy,
) -> bool {
    // EMPTY and NULL are the only operators an absent field can satisfy.
    if matches!(operator, Operator::Empty | Operator::Null) {
        return match record.get(field) {
            Some(actual) => actual.is_empty_value(),
            None => true,
        };
    }

    let actual = match record.get(field) {
        Some(actual) => actual,
        None => return false,
    };

    if operator == Operator::In {
        return match value {
            // SQL form: the field value is one of the listed values.
            Value::List { values } => values.iter().any(|item| eq_scalar(actual, item)),
            // Containment form: the quoted value is a member of the field.
            Value::String { value } => value_in_field(actual, value),
            Value::Missing => false,
        };
    }

    let expected = match value.as_text() {
        Some(text) => text,
        None => return false,
    };

    match operator {
        Operator::Eq => eq_scalar(actual, expected),
        Operator::Ne => !eq_scalar(actual, expected),
        Operator::Contains => contains_value(actual, expected, policy),
        Operator::NotContains => !contains_value(actual, expected, policy),
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            compare_ordered(field, actual, expected, operator, policy)
        }
        Operator::Like => matches_like(&actual.to_display_string(), expected),
        // Handled above.
        Operator::In | Operator::Empty | Operator::Null => false,
    }
}

/// Scalar equality after coercing the textual query value to the field's
/// kind. Lists never equal a scalar.
fn eq_scalar(actual: &FieldValue, expected: &str) -> bool {
    match actual {
        FieldValue::Bool(b) => match expected.to_lowercase().as_str() {
            "true" => *b,
            "false" => !*b,
            _ => false,
        },
        FieldValue::Number(n) => expected.parse::<f64>().map_or(false, |e| *n == e),
        FieldValue::Text(t) => t == expected,
        FieldValue::List(_) => false,
    }
}

/// Substring test for text fields, membership test for list fields.
/// Numbers and booleans are stringified first.
fn contains_value(actual: &FieldValue, expected: &str, policy: &EvalPolicy) -> bool {
    match actual {
        FieldValue::Text(text) => contains_text(text, expected, policy),
        FieldValue::List(items) => {
            if policy.case_insensitive_contains {
                let needle = expected.to_lowercase();
                items.iter().any(|item| item.to_lowercase() == needle)
            } else {
                items.iter().any(|item| item == expected)
            }
        }
        FieldValue::Bool(_) | FieldValue::Number(_) => {
            contains_text(&actual.to_display_string(), expected, policy)
        }
    }
}

fn contains_text(haystack: &str, needle: &str, policy: &EvalPolicy) -> bool {
    if policy.case_insensitive_contains {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    } else {
        haystack.contains(needle)
    }
}

/// Reversed `IN`: the quoted value as a member of a List field or a
/// substring of a Text field. Scalar fields never match.
fn value_in_field(actual: &FieldValue, expected: &str) -> bool {
    match actual {
        FieldValue::List(items) => items.iter().any(|item| item == expected),
        FieldValue::Text(text) => text.contains(expected),
        FieldValue::Bool(_) | FieldValue::Number(_) => false,
    }
}

/// Relational comparison. Defined only for date-listed fields and numeric
/// fields; anything else is false.
fn compare_ordered(
    field: &str,
    actual: &FieldValue,
    expected: &str,
    operator: Operator,
    policy: &EvalPolicy,
) -> bool {
    if policy.is_date_field(field) {
        let actual_date = match actual.as_text().and_then(parse_flexible_date) {
            Some(date) => date,
            None => return false,
        };
        let expected_date = match parse_flexible_date(expected) {
            Some(date) => date,
            None => return false,
        };
        return apply_ordering(operator, actual_date.cmp(&expected_date));
    }

    if let FieldValue::Number(n) = actual {
        if let Ok(e) = expected.parse::<f64>() {
            if let Some(ordering) = n.partial_cmp(&e) {
                return apply_ordering(operator, ordering);
            }
        }
    }

    false
}

fn apply_ordering(operator: Operator, ordering: Ordering) -> bool {
    match operator {
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        _ => false,
    }
}

/// Parse a date string in any accepted format: RFC 3339,
/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`, or `DD.MM.YYYY`.
pub(crate) fn parse_flexible_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}

/// SQL-style LIKE: `%` matches any run of characters, `_` exactly one,
/// the whole pattern is anchored. A pattern without wildcards is an exact
/// match.
fn matches_like(text: &str, pattern: &str) -> bool {
    let mut regex_src = String::with_capacity(pattern.len() * 2 + 2);
    regex_src.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => regex_src.push_str(".*"),
            '_' => regex_src.push('.'),
            ch => regex_src.push_str(&regex::escape(&ch.to_string())),
        }
    }
    regex_src.push('$');

    match regex::Regex::new(&regex_src) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}
