// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Dialect configuration for the FQL grammar.
//!
//! The tokenizer, parser, and evaluator are shared across all dialects; a
//! [`Dialect`] only toggles which spellings the tokenizer accepts and which
//! condition forms the parser allows. The four presets mirror the query
//! languages of the simulated vendor APIs.

use serde::{Deserialize, Serialize};

/// Case policy for boolean keywords and word operators.
///
/// Each dialect accepts exactly one case. `ORDER BY` tails and their
/// `ASC`/`DESC` direction are exempt and always match case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCase {
    Lower,
    Upper,
}

/// Grammar switches for one query dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialect {
    pub keyword_case: KeywordCase,
    /// Accept the word `contains` as a substring operator.
    pub contains_word: bool,
    /// Accept `LIKE` with `%`/`_` wildcards.
    pub like_operator: bool,
    /// Accept SQL-style membership: `field IN ('a', 'b')`.
    pub in_lists: bool,
    /// Accept containment membership: `'a' IN field`.
    pub containment_in: bool,
    /// Accept postfix `EMPTY` and `NULL`.
    pub empty_operators: bool,
    /// Accept unquoted single-word values.
    pub bare_values: bool,
    /// Accept an `ORDER BY field [ASC|DESC]` tail.
    pub order_by: bool,
}

impl Dialect {
    /// Confluence-style CQL: lowercase keywords, symbolic operators only,
    /// quoted values.
    pub fn cql() -> Self {
        Dialect {
            keyword_case: KeywordCase::Lower,
            contains_word: false,
            like_operator: false,
            in_lists: false,
            containment_in: false,
            empty_operators: false,
            bare_values: false,
            order_by: false,
        }
    }

    /// Jira-style JQL: uppercase keywords, postfix `EMPTY`/`NULL`, an
    /// `ORDER BY` tail, quoted values.
    pub fn jql() -> Self {
        Dialect {
            keyword_case: KeywordCase::Upper,
            contains_word: false,
            like_operator: false,
            in_lists: false,
            containment_in: false,
            empty_operators: true,
            bare_values: false,
            order_by: true,
        }
    }

    /// Drive-style file search: lowercase keywords, word `contains`,
    /// containment `in`, bare values.
    pub fn drive() -> Self {
        Dialect {
            keyword_case: KeywordCase::Lower,
            contains_word: true,
            like_operator: false,
            in_lists: false,
            containment_in: true,
            empty_operators: false,
            bare_values: true,
            order_by: false,
        }
    }

    /// Salesforce-style SOQL WHERE clause: uppercase keywords, `LIKE`,
    /// word `CONTAINS`, `IN` lists, an `ORDER BY` tail.
    pub fn soql() -> Self {
        Dialect {
            keyword_case: KeywordCase::Upper,
            contains_word: true,
            like_operator: true,
            in_lists: true,
            containment_in: false,
            empty_operators: false,
            bare_values: true,
            order_by: true,
        }
    }

    /// Whether `word` spells `keyword` under this dialect's case policy.
    /// `keyword` is supplied in uppercase.
    pub(crate) fn keyword_eq(&self, word: &str, keyword: &str) -> bool {
        match self.keyword_case {
            KeywordCase::Upper => word == keyword,
            KeywordCase::Lower => {
                word.len() == keyword.len()
                    && word
                        .bytes()
                        .zip(keyword.bytes())
                        .all(|(w, k)| w == k.to_ascii_lowercase())
            }
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::cql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_case_policies() {
        let lower = Dialect::cql();
        assert!(lower.keyword_eq("and", "AND"));
        assert!(!lower.keyword_eq("AND", "AND"));
        assert!(!lower.keyword_eq("And", "AND"));

        let upper = Dialect::jql();
        assert!(upper.keyword_eq("AND", "AND"));
        assert!(!upper.keyword_eq("and", "AND"));
    }

    #[test]
    fn test_preset_condition_forms() {
        assert!(Dialect::soql().in_lists);
        assert!(!Dialect::soql().containment_in);
        assert!(Dialect::drive().containment_in);
        assert!(!Dialect::drive().in_lists);
        assert!(Dialect::jql().empty_operators);
        assert!(!Dialect::cql().bare_values);
    }
}
