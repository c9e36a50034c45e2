// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! In-memory record store with FQL search.
//!
//! Each store instance owns its collections outright; there is no shared
//! global state, so tests and callers get isolated stores. Collections are
//! plain ordered vectors of records, searched by full scan.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::error::{Result, StoreError};
use crate::fql::{execute, parse_with, Dialect, EvalPolicy, ParsedQuery, Selection};
use crate::record::Record;

/// A named-collection record store queried through one FQL dialect.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    collections: BTreeMap<String, Vec<Record>>,
    dialect: Dialect,
    policy: EvalPolicy,
}

/// One page of search results plus the parsed query that produced it.
#[derive(Debug)]
pub struct SearchResult<'a> {
    pub records: Vec<&'a Record>,
    /// Match count before offset/limit slicing.
    pub total: usize,
    pub offset: usize,
    pub limit: Option<usize>,
    pub query: ParsedQuery,
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        RecordStore {
            dialect,
            ..RecordStore::default()
        }
    }

    /// Replace the evaluation policy (date fields, case handling).
    pub fn set_policy(&mut self, policy: EvalPolicy) {
        self.policy = policy;
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Append a record to a collection, creating the collection on first
    /// use. Insertion order is what an unsorted search returns.
    pub fn insert(&mut self, collection: &str, record: Record) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub fn records(&self, collection: &str) -> &[Record] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.records(collection).len()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.records(collection).is_empty()
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Run an FQL query against one collection.
    ///
    /// A malformed query fails the whole call; there is no partial result.
    /// An unknown collection is an empty result, matching the lenient
    /// behavior of the simulated APIs. An `ORDER BY` tail in the query is
    /// used unless `selection` carries an explicit ordering.
    pub fn search(
        &self,
        collection: &str,
        query: &str,
        selection: &Selection,
    ) -> Result<SearchResult<'_>> {
        let start = Instant::now();
        let parsed = parse_with(query, &self.dialect)?;

        let mut ordering = Selection::new();
        ordering.order_by = selection
            .order_by
            .clone()
            .or_else(|| parsed.order_by.clone());

        let records = self.records(collection);
        let matches = execute(&parsed.expr, records, &self.policy, &ordering);
        let total = matches.len();

        let records: Vec<&Record> = matches
            .into_iter()
            .skip(selection.offset)
            .take(selection.limit.unwrap_or(usize::MAX))
            .collect();

        tracing::debug!(
            collection,
            matched = total,
            returned = records.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Executed search"
        );

        Ok(SearchResult {
            records,
            total,
            offset: selection.offset,
            limit: selection.limit,
            query: parsed,
        })
    }

    /// Write every collection to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.collections)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs::write(path, json)?;

        tracing::info!(
            collections = self.collections.len(),
            path = %path.display(),
            "Saved store state"
        );
        Ok(())
    }

    /// Replace this store's collections with the contents of a JSON file
    /// written by [`RecordStore::save`]. Dialect and policy are kept.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let data = fs::read_to_string(path)?;
        self.collections =
            serde_json::from_str(&data).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        tracing::info!(
            collections = self.collections.len(),
            path = %path.display(),
            "Loaded store state"
        );
        Ok(())
    }
}
