//! casebook-core — case record ingestion core.
//!
//! This crate holds everything with real invariants: the fixed schema and
//! its normalizer, the durable keyed store, and the pipeline driver that
//! ties a [`Fetcher`] to the store.
//!
//! # Architecture
//!
//! ```text
//! input ──► Pipeline ──► Fetcher ──► Normalizer ──► CaseStore
//!                                                    (commit per record)
//! ```
//!
//! The store is constructed explicitly and lent to the pipeline; nothing
//! else touches the database.

pub mod config;
pub mod error;
pub mod fetch;
pub mod input;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod types;

pub use error::{InputError, NormalizationError, StoreError};
pub use fetch::{FetchError, FetchedFields, Fetcher};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};
pub use schema::{Field, Schema};
pub use store::CaseStore;
pub use types::{CaseRecord, Status, StoredCase};
