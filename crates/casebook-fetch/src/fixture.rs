//! Fixture fetcher — detail records served from a JSON file.
//!
//! The file maps identifiers to detail objects:
//!
//! ```json
//! {
//!   "JH100001": { "NAME": "DOE, JOHN", "AGE": "34", "ARREST LOCATION": "001XX W MADISON ST" },
//!   "JH100002": "detail page never loaded"
//! }
//! ```
//!
//! An object is a successful fetch. A string is replayed as a navigation
//! failure with that message. An identifier not in the file is `NotFound`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use casebook_core::{FetchError, FetchedFields, Fetcher};
use serde_json::Value;

use crate::fields_from_json;

#[derive(Debug, Clone)]
enum Entry {
    Fields(FetchedFields),
    Fail(FetchError),
}

/// Serves pre-recorded detail records. Stateless per request.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    entries: HashMap<String, Entry>,
    delay: Duration,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&text)?;
        Self::from_json(&doc).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Build from an already-parsed fixture document.
    pub fn from_json(doc: &Value) -> Result<Self, String> {
        let Value::Object(map) = doc else {
            return Err("fixture document must map identifiers to detail objects".to_string());
        };
        let mut fetcher = Self::new();
        for (cb_no, entry) in map {
            let entry = match entry {
                Value::String(message) => Entry::Fail(FetchError::Navigation(message.clone())),
                other => match fields_from_json(other) {
                    Ok(fields) => Entry::Fields(fields),
                    Err(e) => Entry::Fail(e),
                },
            };
            fetcher.entries.insert(cb_no.clone(), entry);
        }
        Ok(fetcher)
    }

    /// Register a successful detail record.
    pub fn insert(&mut self, cb_no: impl Into<String>, fields: FetchedFields) {
        self.entries.insert(cb_no.into(), Entry::Fields(fields));
    }

    /// Register a failure to replay for `cb_no`.
    pub fn fail(&mut self, cb_no: impl Into<String>, error: FetchError) {
        self.entries.insert(cb_no.into(), Entry::Fail(error));
    }

    /// Wait this long before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Fetcher for FixtureFetcher {
    async fn fetch(&self, cb_no: &str) -> Result<FetchedFields, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.entries.get(cb_no) {
            Some(Entry::Fields(fields)) => Ok(fields.clone()),
            Some(Entry::Fail(e)) => Err(e.clone()),
            None => Err(FetchError::NotFound(cb_no.to_string())),
        }
    }
}
