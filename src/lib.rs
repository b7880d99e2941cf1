//! casebook — fetch, normalize and durably persist case detail records.
//!
//! This crate re-exports the core layers and the fetchers so that
//! integration tests and the binary import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! input ──► Pipeline ──► Fetcher ──► Normalizer ──► CaseStore
//!              │                                      ▲
//!              └──── fetch failure ──► ERROR row ─────┘
//! ```
//!
//! One pass processes each identifier once. Every record is committed to the
//! store before it counts as done, so a crashed or cancelled pass can simply
//! be re-run (optionally with `resume`) over the same input.

pub use casebook_core::{config, error, fetch, input, normalizer, pipeline, schema, store, types};
pub use casebook_core::{
    CaseRecord, CaseStore, FetchError, FetchedFields, Fetcher, Field, InputError,
    NormalizationError, Pipeline, PipelineOptions, RunReport, Schema, Status, StoreError,
    StoredCase,
};
pub use casebook_fetch::{FixtureFetcher, HttpFetcher};
