//! Pipeline driver — fetch, merge and persist each case record in turn.
//!
//! ```text
//! input ──► Fetcher ──► merge enrichment fields ──► CaseStore::upsert
//!              │                                        ▲
//!              └──── FetchError ──► ERROR row ──────────┘
//! ```
//!
//! Per-record fetch and input failures are absorbed into the run report (and,
//! for fetch failures, into an ERROR row). A [`StoreError`] aborts the run:
//! once the durability point is broken nothing downstream can be trusted.

use std::collections::{HashMap, HashSet};

use futures::{future, stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{InputError, StoreError};
use crate::fetch::{FetchedFields, Fetcher};
use crate::schema::{Field, Schema};
use crate::store::CaseStore;
use crate::types::{CaseRecord, Status};

/// Fields the pipeline enriches from fetched detail records unless
/// configured otherwise.
pub const DEFAULT_ENRICH: [Field; 3] = [Field::Name, Field::Age, Field::ArrestLocation];

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Maximum number of fetches in flight at once. `1` is strictly sequential.
    pub concurrency: usize,
    /// Skip identifiers already persisted with status OK.
    pub resume: bool,
    /// Fields overwritten from fetched data; all others keep their input value.
    pub enrich: Vec<Field>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            resume: false,
            enrich: DEFAULT_ENRICH.to_vec(),
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records persisted with status OK.
    pub ok: usize,
    /// Records persisted with status ERROR.
    pub error: usize,
    /// Records skipped because they were already OK in the store.
    pub resumed: usize,
    /// Input records that could not be processed at all.
    pub skipped: Vec<InputError>,
    /// The run stopped early on cancellation with records left unstarted.
    pub cancelled: bool,
}

impl RunReport {
    pub fn persisted(&self) -> usize {
        self.ok + self.error
    }
}

/// Drives records through a [`Fetcher`] into a [`CaseStore`].
pub struct Pipeline<'s, F> {
    store: &'s CaseStore,
    fetcher: F,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl<'s, F: Fetcher> Pipeline<'s, F> {
    pub fn new(store: &'s CaseStore, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            options: PipelineOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop starting new records once `cancel` fires. Records already past
    /// their fetch are still persisted.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one pass over `records`.
    pub async fn run(
        &self,
        records: impl IntoIterator<Item = CaseRecord>,
    ) -> Result<RunReport, StoreError> {
        self.run_input(records.into_iter().map(Ok)).await
    }

    /// Run one pass over loader output, reporting loader errors as skipped.
    ///
    /// Positions in the skipped errors are 1-based ordinals in `input`, the
    /// same numbering the loader uses for the records it yields.
    pub async fn run_input(
        &self,
        input: impl IntoIterator<Item = Result<CaseRecord, InputError>>,
    ) -> Result<RunReport, StoreError> {
        let mut report = RunReport::default();

        let completed = if self.options.resume {
            self.store.completed_ids()?
        } else {
            HashSet::new()
        };

        let mut seen = HashSet::new();
        let mut work = Vec::new();
        for (i, item) in input.into_iter().enumerate() {
            let position = i + 1;
            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping input record");
                    report.skipped.push(e);
                    continue;
                }
            };
            let cb_no = record.cb_no();
            if cb_no.is_empty() {
                let e = InputError::MissingIdentifier { position };
                tracing::warn!(error = %e, "skipping input record");
                report.skipped.push(e);
                continue;
            }
            if !seen.insert(cb_no.to_string()) {
                let e = InputError::Duplicate {
                    cb_no: cb_no.to_string(),
                    position,
                };
                tracing::warn!(error = %e, "skipping input record");
                report.skipped.push(e);
                continue;
            }
            if completed.contains(cb_no) {
                report.resumed += 1;
                continue;
            }
            work.push(record);
        }

        let total = work.len();
        tracing::info!(
            total,
            resumed = report.resumed,
            skipped = report.skipped.len(),
            concurrency = self.options.concurrency,
            "pipeline run starting"
        );

        let cancel = &self.cancel;
        let mut results = std::pin::pin!(stream::iter(work)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|record| self.process(record))
            .buffer_unordered(self.options.concurrency.max(1)));

        while let Some(result) = results.next().await {
            match result {
                Ok(Status::Ok) => report.ok += 1,
                Ok(Status::Error) => report.error += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        ok = report.ok,
                        failed = report.error,
                        "store failure, aborting run"
                    );
                    return Err(e);
                }
            }
        }

        report.cancelled = report.persisted() < total;
        tracing::info!(
            ok = report.ok,
            failed = report.error,
            resumed = report.resumed,
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "pipeline run finished"
        );
        Ok(report)
    }

    /// Fetch, merge and persist a single record. Returns the status written.
    pub async fn process(&self, mut record: CaseRecord) -> Result<Status, StoreError> {
        let cb_no = record.cb_no().to_string();
        tracing::debug!(cb_no = %cb_no, "fetching");

        match self.fetcher.fetch(&cb_no).await {
            Ok(fetched) => {
                merge_fetched(&mut record, &fetched, &self.options.enrich, self.store.schema());
                self.store.upsert(&record, Status::Ok, None)?;
                tracing::debug!(cb_no = %cb_no, "persisted OK");
                Ok(Status::Ok)
            }
            Err(e) => {
                tracing::warn!(cb_no = %cb_no, error = %e, "fetch failed");
                self.store.upsert(&record, Status::Error, Some(&e.to_string()))?;
                Ok(Status::Error)
            }
        }
    }
}

/// Overwrite the `enrich` fields of `record` from a fetched mapping.
///
/// Fetched labels are normalized before matching. An enrichment field the
/// mapping does not mention is blanked, the same as any other absent value.
pub fn merge_fetched(
    record: &mut CaseRecord,
    fetched: &FetchedFields,
    enrich: &[Field],
    schema: &Schema,
) {
    let by_field: HashMap<Field, &str> = fetched
        .iter()
        .filter_map(|(label, value)| schema.resolve(label).map(|f| (f, value.as_str())))
        .collect();

    for field in enrich {
        if *field == Field::CbNo {
            continue;
        }
        record.set(*field, by_field.get(field).copied().unwrap_or(""));
    }
}
