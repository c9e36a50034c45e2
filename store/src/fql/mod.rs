// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQL (Filter Query Language) Module
//!
//! An infix boolean query language for filtering record collections, with
//! dialect presets matching the query languages of the simulated vendor
//! APIs.
//!
//! # Syntax
//!
//! ```text
//! status = 'current'
//! type = 'page' and space = 'DEV'
//! (space = 'DEV' or space = 'HR') and not status = 'trashed'
//! title ~ 'summer'
//! created > '2024-03-01'
//! Industry IN ('Tech', 'Energy')
//! 'root' in parents
//! assignee EMPTY
//! status = 'open' ORDER BY created DESC
//! ```
//!
//! # Operators
//!
//! | Operator | Meaning | Example |
//! |----------|---------|---------|
//! | `=` | Exact match | `status = 'current'` |
//! | `!=` | Not equal | `status != 'trashed'` |
//! | `~`, `contains` | Substring / list membership | `title ~ 'summer'` |
//! | `!~` | Not containing | `title !~ 'winter'` |
//! | `>`, `>=`, `<`, `<=` | Numeric or date range | `created > '2024-03-01'` |
//! | `IN` | List membership | `Industry IN ('Tech', 'Energy')` |
//! | `IN` (containment) | Value within a field | `'root' in parents` |
//! | `LIKE` | Wildcard match, `%` and `_` | `Name LIKE 'Acme%'` |
//! | `EMPTY`, `NULL` | Absent or empty field | `assignee EMPTY` |
//! | `NOT` | Negation | `not status = 'trashed'` |
//!
//! # Dialects
//!
//! | Preset | Keywords | Extra forms |
//! |--------|----------|-------------|
//! | [`Dialect::cql`] | lowercase | symbolic operators only |
//! | [`Dialect::jql`] | uppercase | `EMPTY`/`NULL`, `ORDER BY` |
//! | [`Dialect::drive`] | lowercase | `contains`, `'v' in field`, bare values |
//! | [`Dialect::soql`] | uppercase | `LIKE`, `CONTAINS`, `IN` lists, `ORDER BY` |
//!
//! Evaluation is identical across dialects and is permissive: an absent
//! field or a type mismatch makes the condition false rather than raising.
//! Date-aware comparisons apply to fields the caller lists in
//! [`EvalPolicy::date_fields`].

pub mod ast;
pub mod dialect;
pub mod eval;
pub mod executor;
pub mod parser;

pub use ast::{
    Expression, FqlError, FqlErrorKind, Operator, OrderBy, ParsedQuery, Position, SortDirection,
    Value,
};
pub use dialect::{Dialect, KeywordCase};
pub use eval::{evaluate, EvalPolicy};
pub use executor::{execute, Selection};
pub use parser::{parse, parse_with, MAX_NESTING_DEPTH, MAX_QUERY_LEN};
