//! Core types for casebook-core.
//!
//! [`CaseRecord`] is the unit of work and persistence, [`Status`] the outcome
//! of its last processing attempt, and [`StoredCase`] a row read back from
//! the store together with its metadata.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::normalizer::coerce_value;
use crate::schema::{Field, Schema};

/// Source format of `ARREST DATE`, e.g. `01/15/2024 10:30:00 PM`.
pub const ARREST_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// A case record with every fixed-schema field held as normalized text.
///
/// Fields that were never set read as `""`, so a record always has a value
/// for every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    values: [String; Field::COUNT],
}

impl CaseRecord {
    /// A record with only its identifier set.
    pub fn new(cb_no: impl Into<String>) -> Self {
        let mut record = Self {
            values: std::array::from_fn(|_| String::new()),
        };
        record.set(Field::CbNo, cb_no);
        record
    }

    /// Build a record from `(label, raw value)` pairs keyed by free-form
    /// labels. Labels that do not name a schema field are returned alongside
    /// the record rather than silently discarded.
    pub fn from_raw<'a, I>(schema: &Schema, pairs: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (&'a str, Option<&'a Value>)>,
    {
        let mut record = Self::new("");
        let mut unknown = Vec::new();
        for (label, raw) in pairs {
            match schema.resolve(label) {
                Some(field) => record.set(field, coerce_value(raw)),
                None => unknown.push(label.to_string()),
            }
        }
        (record, unknown)
    }

    pub fn cb_no(&self) -> &str {
        self.get(Field::CbNo)
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Set one field. The identifier is stored trimmed, so `" JH1 "` and
    /// `"JH1"` are the same record everywhere: dedup, fetch and primary key.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let mut value = value.into();
        if field == Field::CbNo {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                value = trimmed.to_string();
            }
        }
        self.values[field.index()] = value;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Every field with its value, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }
}

/// Outcome of the last processing attempt for an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Status::Ok),
            "ERROR" => Ok(Status::Error),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// A row read back from the store.
///
/// Everything is text exactly as stored. The typed accessors parse on demand
/// and return `None` instead of failing when the text does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCase {
    pub record: CaseRecord,
    pub status: String,
    pub error: String,
    pub updated_at: String,
}

impl StoredCase {
    pub fn status(&self) -> Option<Status> {
        self.status.parse().ok()
    }

    pub fn age(&self) -> Option<u32> {
        self.record.get(Field::Age).trim().parse().ok()
    }

    pub fn arrest_date(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.record.get(Field::ArrestDate).trim(), ARREST_DATE_FORMAT)
            .ok()
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.updated_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}
