//! Shared test utilities for casebook integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Fetch timing is deterministic under
//! `tokio::time::pause()` / `start_paused = true`.

pub mod assertions;
pub mod builders;
pub mod fake_detail_api;
pub mod fake_fetcher;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_detail_api::*;
pub use fake_fetcher::*;
pub use fixtures::*;
