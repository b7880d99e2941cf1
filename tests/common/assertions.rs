//! Domain-specific assertion macros for casebook harnesses.
//!
//! These wrap `pretty_assertions` and say which stored row broke which
//! expectation.

use casebook::{CaseStore, StoredCase};

/// Assert that the store holds a row for `cb_no` with the given status and
/// return it.
///
/// ```rust
/// let row = assert_row!(store, "JH100001", "OK");
/// ```
#[macro_export]
macro_rules! assert_row {
    ($store:expr, $cb_no:expr, $status:expr) => {{
        let store: &casebook::CaseStore = &$store;
        let cb_no: &str = $cb_no;
        match store.get(cb_no).expect("store read failed") {
            Some(row) => {
                pretty_assertions::assert_eq!(
                    row.status,
                    $status,
                    "assert_row! failed: wrong status for {:?} (error: {:?})",
                    cb_no,
                    row.error
                );
                row
            }
            None => panic!("assert_row! failed: no row for {:?}", cb_no),
        }
    }};
}

/// Assert that a stored row has `field` set to `value`.
///
/// ```rust
/// assert_field!(row, Field::Name, "DOE, JOHN");
/// ```
#[macro_export]
macro_rules! assert_field {
    ($row:expr, $field:expr, $value:expr) => {{
        let row: &casebook::StoredCase = &$row;
        let field: casebook::Field = $field;
        let actual = row.record.get(field);
        if actual != $value {
            panic!(
                "assert_field! failed for {:?}:\n  field:    {}\n  expected: {:?}\n  actual:   {:?}",
                row.record.cb_no(),
                field,
                $value,
                actual
            );
        }
    }};
}

/// A stored row without its `updated_at`, for comparing content across runs.
pub fn content(row: &StoredCase) -> StoredCase {
    StoredCase {
        updated_at: String::new(),
        ..row.clone()
    }
}

/// Every row in the store, content only.
pub fn all_content(store: &CaseStore) -> Vec<StoredCase> {
    store.all().unwrap().iter().map(content).collect()
}
