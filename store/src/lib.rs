// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Library crate for the simulated-API record store and its FQL query engine.

pub mod error;
pub mod fql;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use record::{FieldValue, Record};
pub use store::{RecordStore, SearchResult};
