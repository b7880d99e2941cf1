//! Store — durable keyed table of [`CaseRecord`](crate::CaseRecord) rows.
//!
//! One SQLite table, one TEXT column per schema field plus `status`, `error`
//! and `updated_at`, primary key `cb_no`. Every [`CaseStore::upsert`] is its
//! own committed transaction, so a record is durable before the call returns.
//! The connection is owned here and nowhere else.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use crate::error::StoreError;
use crate::schema::{Field, Schema, META_COLUMNS};
use crate::types::{CaseRecord, Status, StoredCase};

/// Name of the case table.
pub const TABLE: &str = "arrests";

/// Default time a writer waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Keyed, synchronously-committed case store.
///
/// Safe to share between concurrent pipeline workers: writes to distinct
/// identifiers never interfere, and two writes to the same identifier are
/// last-writer-wins with no finer conflict resolution.
pub struct CaseStore {
    conn: Mutex<Connection>,
    schema: Schema,
    upsert_sql: String,
    select_sql: String,
}

impl CaseStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Does not touch the schema; call [`initialize`](Self::initialize) before
    /// the first write.
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self, StoreError> {
        Self::open_with_timeout(path, schema, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(
        path: impl AsRef<Path>,
        schema: Schema,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.as_ref().display(), journal_mode = %mode, "opened case store");
        conn.pragma_update(None, "synchronous", "FULL")?;
        Ok(Self::with_connection(conn, schema))
    }

    /// A private in-memory database, mostly for tests.
    pub fn open_in_memory(schema: Schema) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(conn, schema))
    }

    fn with_connection(conn: Connection, schema: Schema) -> Self {
        let columns: Vec<String> = schema.columns().chain(META_COLUMNS).map(quote).collect();
        let key = quote(schema.key_column());

        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let update_set = columns
            .iter()
            .filter(|c| **c != key)
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let upsert_sql = format!(
            "INSERT INTO {TABLE} ({cols}) VALUES ({placeholders}) \
             ON CONFLICT({key}) DO UPDATE SET {update_set}",
            cols = columns.join(", "),
        );
        let select_sql = format!("SELECT {} FROM {TABLE}", columns.join(", "));

        Self {
            conn: Mutex::new(conn),
            schema,
            upsert_sql,
            select_sql,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Ensure the case table exists with every expected column.
    ///
    /// Idempotent: on a table that already matches, nothing changes. Columns
    /// missing from an older table are added as TEXT; existing rows read them
    /// as `""`. A table without the key column cannot be repaired and is
    /// reported as [`StoreError::SchemaMismatch`].
    pub fn initialize(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let column_defs = self
            .schema
            .columns()
            .chain(META_COLUMNS)
            .map(|c| format!("  {} TEXT", quote(c)))
            .collect::<Vec<_>>()
            .join(",\n");
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (\n{column_defs},\n  PRIMARY KEY ({key})\n)",
            key = quote(self.schema.key_column()),
        ))?;

        let existing: HashSet<String> = {
            let mut stmt = tx.prepare(&format!("PRAGMA table_info({TABLE})"))?;
            let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
            names.collect::<Result<_, _>>()?
        };

        if !existing.contains(self.schema.key_column()) {
            return Err(StoreError::SchemaMismatch {
                table: TABLE.to_string(),
                column: self.schema.key_column().to_string(),
            });
        }

        for column in self.schema.columns().chain(META_COLUMNS) {
            if !existing.contains(column) {
                tracing::info!(column, "adding missing column to {TABLE}");
                tx.execute_batch(&format!(
                    "ALTER TABLE {TABLE} ADD COLUMN {} TEXT",
                    quote(column)
                ))?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Insert or fully overwrite the row for `record`'s identifier.
    ///
    /// Every non-key column is replaced, including with blanks. `error` is
    /// stored as `""` when `None`. Returns the `updated_at` written, which is
    /// strictly later than the one it replaces. The row is committed before
    /// this returns.
    pub fn upsert(
        &self,
        record: &CaseRecord,
        status: Status,
        error: Option<&str>,
    ) -> Result<String, StoreError> {
        if record.cb_no().is_empty() {
            return Err(StoreError::BlankIdentifier);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<Option<String>> = tx
            .query_row(
                &format!(
                    "SELECT updated_at FROM {TABLE} WHERE {key} = ?1",
                    key = quote(self.schema.key_column())
                ),
                params![record.cb_no()],
                |row| row.get(0),
            )
            .optional()?;
        let updated_at = next_timestamp(Utc::now(), previous.flatten().as_deref());

        {
            let mut stmt = tx.prepare_cached(&self.upsert_sql)?;
            let values = record
                .fields()
                .map(|(_, v)| v)
                .chain([status.as_str(), error.unwrap_or(""), updated_at.as_str()]);
            stmt.execute(params_from_iter(values))?;
        }

        tx.commit()?;
        Ok(updated_at)
    }

    /// Read back one row by identifier.
    pub fn get(&self, cb_no: &str) -> Result<Option<StoredCase>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "{} WHERE {key} = ?1",
            self.select_sql,
            key = quote(self.schema.key_column())
        );
        let row = conn
            .query_row(&sql, params![cb_no], |row| read_row(row))
            .optional()?;
        Ok(row)
    }

    /// Every row, ordered by identifier.
    pub fn all(&self) -> Result<Vec<StoredCase>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "{} ORDER BY {key}",
            self.select_sql,
            key = quote(self.schema.key_column())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| read_row(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Identifiers whose last attempt was persisted with [`Status::Ok`].
    pub fn completed_ids(&self) -> Result<HashSet<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {key} FROM {TABLE} WHERE status = ?1",
            key = quote(self.schema.key_column())
        ))?;
        let ids = stmt.query_map(params![Status::Ok.as_str()], |row| row.get::<_, String>(0))?;
        Ok(ids.collect::<Result<_, _>>()?)
    }

    /// Row count per stored status text.
    pub fn status_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT COALESCE(status, ''), COUNT(*) FROM {TABLE} GROUP BY 1"
        ))?;
        let counts = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let n: i64 = row.get(1)?;
            Ok((status, usize::try_from(n).unwrap_or(0)))
        })?;
        Ok(counts.collect::<Result<_, _>>()?)
    }

    /// Close the connection, flushing anything SQLite still buffers.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self.conn.into_inner().map_err(|_| StoreError::Poisoned)?;
        conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}

/// Quote a column name for SQL. Custom schemas may produce keys that are
/// keywords (`order`) or start with a digit.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCase> {
    let mut record = CaseRecord::new("");
    for field in Field::ALL {
        let value: Option<String> = row.get(field.index())?;
        record.set(*field, value.unwrap_or_default());
    }
    let meta = |i: usize| -> rusqlite::Result<String> {
        Ok(row
            .get::<_, Option<String>>(Field::COUNT + i)?
            .unwrap_or_default())
    };
    Ok(StoredCase {
        record,
        status: meta(0)?,
        error: meta(1)?,
        updated_at: meta(2)?,
    })
}

/// ISO-8601 UTC timestamp for a write at `now`, pushed one microsecond past
/// `previous` when the clock has not moved beyond it.
fn next_timestamp(now: DateTime<Utc>, previous: Option<&str>) -> String {
    let floor = previous
        .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
        .map(|p| p.with_timezone(&Utc) + chrono::Duration::microseconds(1));
    let ts = match floor {
        Some(floor) if floor > now => floor,
        _ => now,
    };
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
