//! casebook-fetch — detail record sources for casebook.
//!
//! Each fetcher resolves one case identifier to a raw `label → value`
//! mapping for the pipeline in [`casebook_core::pipeline`]. Values are
//! whitespace-cleaned here, before the core ever sees them.

pub mod fixture;
pub mod http;

pub use fixture::FixtureFetcher;
pub use http::HttpFetcher;

use casebook_core::normalizer::{clean_text, coerce_value};
use casebook_core::{FetchError, FetchedFields};
use serde_json::Value;

/// Turn one detail document (a JSON object of labels) into fetched fields.
///
/// Labels and values are whitespace-cleaned; `null` values become `""`.
/// Anything other than a non-empty object means the page did not have the
/// markup we expected.
pub fn fields_from_json(doc: &Value) -> Result<FetchedFields, FetchError> {
    let Value::Object(map) = doc else {
        return Err(FetchError::MissingMarkup(
            "detail document is not an object".to_string(),
        ));
    };
    if map.is_empty() {
        return Err(FetchError::MissingMarkup(
            "detail document has no fields".to_string(),
        ));
    }
    Ok(map
        .iter()
        .map(|(label, value)| (clean_text(label), clean_text(&coerce_value(Some(value)))))
        .collect())
}
