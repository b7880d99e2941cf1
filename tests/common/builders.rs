//! Test builders — ergonomic constructors for records, fetched fields and
//! stores.
//!
//! These are for readability in assertions, not production use. They panic
//! on invalid input rather than returning `Result`.

use casebook::{CaseRecord, CaseStore, FetchedFields, Field, Schema};
use std::path::Path;

/// An input record as the loader would produce it: identifier plus the
/// source columns, with the enrichment fields still blank.
pub fn case(cb_no: &str) -> CaseRecord {
    CaseRecord::new(cb_no)
        .with(Field::CaseNumber, format!("JG{}", &cb_no[cb_no.len().saturating_sub(6)..]))
        .with(Field::ArrestDate, "01/15/2024 10:30:00 PM")
        .with(Field::Race, "WHITE HISPANIC")
        .with(Field::Charge1Statute, "720 ILCS 5.0/12-3.2-A-1")
        .with(Field::Charge1Description, "DOMESTIC BATTERY - BODILY HARM")
        .with(Field::Charge1Type, "M")
        .with(Field::Charge1Class, "A")
        .with(Field::ChargesStatute, "720 ILCS 5.0/12-3.2-A-1")
}

/// Build a set of records from identifiers.
pub fn cases(ids: &[&str]) -> Vec<CaseRecord> {
    ids.iter().map(|id| case(id)).collect()
}

/// Fetched detail fields from label/value pairs.
pub fn fetched(pairs: &[(&str, &str)]) -> FetchedFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A typical successful detail page for `cb_no`.
pub fn detail(cb_no: &str) -> FetchedFields {
    fetched(&[
        ("NAME", &format!("DOE, {cb_no}")),
        ("AGE", "34"),
        ("ARREST LOCATION", "001XX W MADISON ST"),
        ("CB #", cb_no),
    ])
}

/// An initialized in-memory store.
pub fn memory_store() -> CaseStore {
    let store = CaseStore::open_in_memory(Schema::new().unwrap()).unwrap();
    store.initialize().unwrap();
    store
}

/// An initialized store backed by `dir/cases.sqlite`.
pub fn file_store(dir: &Path) -> CaseStore {
    let store = CaseStore::open(dir.join("cases.sqlite"), Schema::new().unwrap()).unwrap();
    store.initialize().unwrap();
    store
}
