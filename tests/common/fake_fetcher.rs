//! ScriptedFetcher — an in-process [`Fetcher`] with scripted answers.
//!
//! Records the order identifiers were fetched in, tracks how many fetches
//! were in flight at once, and can fire a cancellation token when a given
//! identifier is fetched. Use with `tokio::time::pause()` for deterministic
//! concurrency tests.

use casebook::{FetchError, FetchedFields, Fetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::builders::detail;

#[derive(Default)]
pub struct ScriptedFetcher {
    answers: HashMap<String, Result<FetchedFields, FetchError>>,
    delay: Duration,
    cancel_on: Option<(String, CancellationToken)>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    /// Unscripted identifiers answer with [`detail`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, cb_no: &str, fields: FetchedFields) -> Self {
        self.answers.insert(cb_no.to_string(), Ok(fields));
        self
    }

    pub fn fail(mut self, cb_no: &str, error: FetchError) -> Self {
        self.answers.insert(cb_no.to_string(), Err(error));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cancel `token` when `cb_no` is fetched (before answering).
    pub fn cancel_on(mut self, cb_no: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((cb_no.to_string(), token));
        self
    }

    /// Identifiers in the order they were fetched.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, cb_no: &str) -> Result<FetchedFields, FetchError> {
        self.calls.lock().unwrap().push(cb_no.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some((id, token)) = &self.cancel_on {
            if id == cb_no {
                token.cancel();
            }
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answers
            .get(cb_no)
            .cloned()
            .unwrap_or_else(|| Ok(detail(cb_no)))
    }
}
