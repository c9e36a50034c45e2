// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQL Query Executor - filters a record collection through an expression
//! tree, then applies ordering and pagination.
//!
//! The executor never mutates the records it is handed; results are
//! references into the caller's collection. Filtering is stable, and so is
//! sorting, so records with equal sort keys keep their relative order.

use std::cmp::Ordering;

use super::ast::{Expression, OrderBy, SortDirection};
use super::eval::{evaluate, parse_flexible_date, EvalPolicy};
use crate::record::{FieldValue, Record};

/// Ordering and slicing options for one query call.
///
/// `order_by` here takes precedence over an `ORDER BY` tail parsed from the
/// query string; `limit` of `None` returns every match.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub order_by: Option<OrderBy>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Execute an expression against a record collection.
///
/// Filters with [`evaluate`] preserving input order, applies the selection's
/// ordering, then slices by offset and limit.
pub fn execute<'a>(
    expr: &Expression,
    records: &'a [Record],
    policy: &EvalPolicy,
    selection: &Selection,
) -> Vec<&'a Record> {
    let mut matches: Vec<&Record> = records
        .iter()
        .filter(|record| evaluate(expr, record, policy))
        .collect();

    if let Some(order_by) = &selection.order_by {
        sort_records(&mut matches, order_by, policy);
    }

    matches
        .into_iter()
        .skip(selection.offset)
        .take(selection.limit.unwrap_or(usize::MAX))
        .collect()
}

fn sort_records(matches: &mut [&Record], order_by: &OrderBy, policy: &EvalPolicy) {
    matches.sort_by(|a, b| {
        let key_a = sort_key(a, &order_by.field, policy);
        let key_b = sort_key(b, &order_by.field, policy);
        match order_by.direction {
            SortDirection::Ascending => compare_keys(&key_a, &key_b),
            SortDirection::Descending => compare_keys(&key_b, &key_a),
        }
    });
}

/// Sort rank of one record under an ordering field. Absent values rank
/// lowest, then booleans, numbers, text, lists. Date-listed fields rank by
/// parsed timestamp; an unparseable date ranks like an absent value.
enum SortKey<'a> {
    Missing,
    Bool(bool),
    Number(f64),
    Text(&'a str),
    List(&'a [String]),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::List(_) => 4,
        }
    }
}

fn sort_key<'a>(record: &'a Record, field: &str, policy: &EvalPolicy) -> SortKey<'a> {
    match record.get(field) {
        None => SortKey::Missing,
        Some(FieldValue::Bool(b)) => SortKey::Bool(*b),
        Some(FieldValue::Number(n)) => SortKey::Number(*n),
        Some(FieldValue::Text(t)) => {
            if policy.is_date_field(field) {
                return match parse_flexible_date(t) {
                    Some(dt) => SortKey::Number(dt.and_utc().timestamp() as f64),
                    None => SortKey::Missing,
                };
            }
            SortKey::Text(t)
        }
        Some(FieldValue::List(items)) => SortKey::List(items),
    }
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (SortKey::List(x), SortKey::List(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fql::parser::{parse, parse_with};
    use crate::fql::Dialect;
    use crate::record::record;

    fn titles(results: &[&Record]) -> Vec<String> {
        results
            .iter()
            .map(|r| {
                r.get("title")
                    .and_then(FieldValue::as_text)
                    .unwrap_or("")
                    .to_string()
            })
            .collect()
    }

    fn fixture() -> Vec<Record> {
        vec![
            record([("title", "alpha"), ("status", "current"), ("created", "2024-01-10")]),
            record([("title", "bravo"), ("status", "trashed"), ("created", "2024-03-05")]),
            record([("title", "charlie"), ("status", "current"), ("created", "15.02.2024")]),
            record([("title", "delta"), ("status", "current")]),
            record([("title", "echo"), ("status", "trashed"), ("created", "2023-12-31")]),
        ]
    }

    #[test]
    fn test_match_all_preserves_input_order() {
        let records = fixture();
        let query = parse("").unwrap();
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &Selection::new());
        assert_eq!(titles(&results), ["alpha", "bravo", "charlie", "delta", "echo"]);
    }

    #[test]
    fn test_filter_is_stable() {
        let records = fixture();
        let query = parse("status = 'current'").unwrap();
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &Selection::new());
        assert_eq!(titles(&results), ["alpha", "charlie", "delta"]);
    }

    #[test]
    fn test_offset_and_limit_slice() {
        let records = fixture();
        let query = parse("").unwrap();
        let selection = Selection::new().offset(2).limit(2);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert_eq!(titles(&results), ["charlie", "delta"]);

        // Offset past the end yields nothing rather than panicking.
        let selection = Selection::new().offset(10);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert!(results.is_empty());
    }

    #[test]
    fn test_sort_by_text_field() {
        let records = vec![
            record([("title", "bravo")]),
            record([("title", "alpha")]),
            record([("title", "charlie")]),
        ];
        let query = parse("").unwrap();

        let selection = Selection::new().order_by("title", SortDirection::Ascending);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert_eq!(titles(&results), ["alpha", "bravo", "charlie"]);

        let selection = Selection::new().order_by("title", SortDirection::Descending);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert_eq!(titles(&results), ["charlie", "bravo", "alpha"]);
    }

    #[test]
    fn test_sort_missing_values_first() {
        let records = fixture();
        let policy = EvalPolicy::new().date_fields(["created"]);
        let query = parse("").unwrap();

        let selection = Selection::new().order_by("created", SortDirection::Ascending);
        let results = execute(&query.expr, &records, &policy, &selection);
        // delta has no created field and sorts before every dated record;
        // dates order chronologically across formats.
        assert_eq!(titles(&results), ["delta", "echo", "alpha", "charlie", "bravo"]);

        let selection = Selection::new().order_by("created", SortDirection::Descending);
        let results = execute(&query.expr, &records, &policy, &selection);
        assert_eq!(titles(&results), ["bravo", "charlie", "alpha", "echo", "delta"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let records = vec![
            record([("title", "first"), ("status", "current")]),
            record([("title", "second"), ("status", "current")]),
            record([("title", "third"), ("status", "current")]),
        ];
        let query = parse("").unwrap();
        let selection = Selection::new().order_by("status", SortDirection::Descending);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert_eq!(titles(&results), ["first", "second", "third"]);
    }

    #[test]
    fn test_sort_mixed_kinds_rank_by_type() {
        let records = vec![
            record([("title", FieldValue::from("text")), ("v", FieldValue::from("zzz"))]),
            record([("title", FieldValue::from("number")), ("v", FieldValue::from(3.0))]),
            record([("title", FieldValue::from("bool")), ("v", FieldValue::from(true))]),
            record([("title", FieldValue::from("missing"))]),
        ];
        let query = parse("").unwrap();
        let selection = Selection::new().order_by("v", SortDirection::Ascending);
        let results = execute(&query.expr, &records, &EvalPolicy::new(), &selection);
        assert_eq!(titles(&results), ["missing", "bool", "number", "text"]);
    }

    #[test]
    fn test_filter_sort_and_slice_together() {
        let records = fixture();
        let policy = EvalPolicy::new().date_fields(["created"]);
        let query = parse_with("status = 'current'", &Dialect::cql()).unwrap();
        let selection = Selection::new()
            .order_by("created", SortDirection::Descending)
            .limit(2);
        let results = execute(&query.expr, &records, &policy, &selection);
        assert_eq!(titles(&results), ["charlie", "alpha"]);
    }
}
