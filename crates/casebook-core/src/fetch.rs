//! The remote record fetcher seam.
//!
//! A [`Fetcher`] turns a case identifier into a raw `label → value` mapping.
//! How it gets there (HTTP, a browser session, a fixture file) is its own
//! business; the pipeline only sees the mapping or a [`FetchError`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Raw detail fields keyed by free-form labels (not yet normalized).
pub type FetchedFields = BTreeMap<String, String>;

/// The remote source could not produce a record for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("no detail record for {0}")]
    NotFound(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("missing expected markup: {0}")]
    MissingMarkup(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Source of per-case detail records.
///
/// Implementations are shared by every in-flight fetch of a pipeline run, so
/// they must not keep per-request mutable session state behind `&self`
/// unless that state is safe to share.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        cb_no: &str,
    ) -> impl Future<Output = Result<FetchedFields, FetchError>> + Send;
}

impl<F: Fetcher> Fetcher for &F {
    fn fetch(
        &self,
        cb_no: &str,
    ) -> impl Future<Output = Result<FetchedFields, FetchError>> + Send {
        (**self).fetch(cb_no)
    }
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch(
        &self,
        cb_no: &str,
    ) -> impl Future<Output = Result<FetchedFields, FetchError>> + Send {
        (**self).fetch(cb_no)
    }
}
