// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQL abstract syntax tree types.
//!
//! These types serialize to a stable JSON shape so parsed queries and errors
//! can be surfaced through API payloads.

use serde::{Deserialize, Serialize};

/// A parsed FQL query: the raw query text, the expression tree, and the
/// optional `ORDER BY` tail for dialects that allow one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub raw: String,
    pub expr: Expression,
    pub order_by: Option<OrderBy>,
}

/// Expression node in the FQL AST.
///
/// The tree is immutable once built. A query is parsed once and the tree may
/// be evaluated against any number of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    /// The empty query. Matches every record.
    MatchAll,
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not {
        inner: Box<Expression>,
    },
    Comparison {
        field: String,
        operator: Operator,
        value: Value,
    },
}

/// Comparison operators supported by FQL.
///
/// Which spellings reach the parser depends on the [`Dialect`]; the
/// evaluation semantics of each operator never change across dialects.
///
/// [`Dialect`]: crate::fql::Dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,          // =
    Ne,          // !=
    Lt,          // <
    Le,          // <=
    Gt,          // >
    Ge,          // >=
    Contains,    // ~ or the word `contains`
    NotContains, // !~
    In,          // IN, both list and containment forms
    Like,        // LIKE, % and _ wildcards
    Empty,       // postfix EMPTY
    Null,        // postfix NULL
}

impl Operator {
    /// Canonical spelling, used when rendering a tree back to query text.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Contains => "~",
            Operator::NotContains => "!~",
            Operator::In => "IN",
            Operator::Like => "LIKE",
            Operator::Empty => "EMPTY",
            Operator::Null => "NULL",
        }
    }
}

/// Right-hand side of a comparison.
///
/// Values stay textual in the tree; the evaluator coerces them against the
/// record field's kind at match time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    String { value: String },
    List { values: Vec<String> },
    /// Postfix operators (`EMPTY`, `NULL`) carry no right-hand value.
    Missing,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[String]> {
        match self {
            Value::List { values } => Some(values),
            _ => None,
        }
    }
}

/// `ORDER BY` tail of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Expression {
    /// Binding strength for canonical rendering. Higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Expression::Or { .. } => 1,
            Expression::And { .. } => 2,
            Expression::Not { .. } => 3,
            Expression::MatchAll | Expression::Comparison { .. } => 4,
        }
    }
}

fn write_operand(
    f: &mut std::fmt::Formatter<'_>,
    node: &Expression,
    parent: u8,
    is_right: bool,
) -> std::fmt::Result {
    // Parenthesize when the child binds looser than the parent, and on the
    // right side also when it binds equally, so left-associative reparsing
    // reconstructs the same tree.
    let needs_parens = if is_right {
        node.precedence() <= parent
    } else {
        node.precedence() < parent
    };
    if needs_parens {
        write!(f, "({})", node)
    } else {
        write!(f, "{}", node)
    }
}

impl std::fmt::Display for Expression {
    /// Renders the canonical query string: uppercase keywords, symbolic
    /// operators, single-quoted values. Reparsing the output under an
    /// uppercase-keyword dialect yields a structurally identical tree.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::MatchAll => Ok(()),
            Expression::And { left, right } => {
                write_operand(f, left, self.precedence(), false)?;
                write!(f, " AND ")?;
                write_operand(f, right, self.precedence(), true)
            }
            Expression::Or { left, right } => {
                write_operand(f, left, self.precedence(), false)?;
                write!(f, " OR ")?;
                write_operand(f, right, self.precedence(), true)
            }
            Expression::Not { inner } => {
                write!(f, "NOT ")?;
                write_operand(f, inner, self.precedence(), false)
            }
            Expression::Comparison {
                field,
                operator,
                value,
            } => match (operator, value) {
                // Containment IN reads value-first: `'x' IN labels`.
                (Operator::In, Value::String { value }) => {
                    write!(f, "'{}' IN {}", escape_quoted(value), field)
                }
                (Operator::Empty, _) | (Operator::Null, _) => {
                    write!(f, "{} {}", field, operator.symbol())
                }
                _ => {
                    write!(f, "{} {} {}", field, operator.symbol(), value)
                }
            },
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String { value } => write!(f, "'{}'", escape_quoted(value)),
            Value::List { values } => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}'", escape_quoted(v))?;
                }
                write!(f, ")")
            }
            Value::Missing => Ok(()),
        }
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// FQL tokenization/parsing error.
#[derive(Debug, Clone, Serialize)]
pub struct FqlError {
    pub kind: FqlErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FqlErrorKind {
    /// Malformed atom or unrecognized character sequence.
    Tokenize,
    /// Structurally invalid token sequence.
    Parse,
}

/// Source location of a token or error, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for FqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = &self.position {
            write!(
                f,
                "{} (line {}, column {})",
                self.message, pos.line, pos.column
            )
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for FqlError {}
