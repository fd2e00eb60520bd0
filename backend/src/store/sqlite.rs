//! SQLite-backed store.
//!
//! Each operation opens its own connection, so any number of threads or
//! processes can share one database file. Writers take an immediate
//! transaction; SQLite's write lock makes the counter bump and the schema
//! mutations atomic across connections, and the configured busy timeout bounds
//! how long a caller waits for that lock.

use super::{CounterStore, FieldStorage, RawFieldDefinitions, SchemaStore, StoredSchema};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS document_counters (
        scope_key TEXT NOT NULL,
        date_part TEXT NOT NULL,
        last_sequence INTEGER NOT NULL,
        PRIMARY KEY (scope_key, date_part)
    );
    CREATE TABLE IF NOT EXISTS form_schemas (
        template_name TEXT PRIMARY KEY NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        field_definitions TEXT NOT NULL,
        template_file_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

const SELECT_SCHEMA: &str = "SELECT template_name, description, field_definitions, \
     template_file_id, created_at, updated_at FROM form_schemas";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
    field_storage: FieldStorage,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and makes sure both
    /// tables exist.
    pub fn open(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        field_storage: FieldStorage,
    ) -> Result<Self> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
            busy_timeout,
            field_storage,
        };
        let conn = store.connect()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!("Opened document store at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn field_storage(&self) -> FieldStorage {
        self.field_storage
    }

    fn connect(&self) -> Result<Connection> {
        self.connect_before(None)
    }

    /// Like `connect`, but lock waits never run past `deadline`.
    fn connect_before(&self, deadline: Option<Instant>) -> Result<Connection> {
        let busy_timeout = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return Err(deadline_passed());
                }
                self.busy_timeout.min(left)
            }
            None => self.busy_timeout,
        };
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(busy_timeout)?;
        Ok(conn)
    }
}

impl CounterStore for SqliteStore {
    fn increment(
        &self,
        scope_key: &str,
        date_part: &str,
        limit: u32,
        deadline: Option<Instant>,
    ) -> Result<Option<u32>> {
        let mut conn = self.connect_before(deadline)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // No row comes back when the WHERE guard rejects the update.
        let next: Option<u32> = tx
            .query_row(
                "INSERT INTO document_counters (scope_key, date_part, last_sequence)
                 VALUES (?1, ?2, 1)
                 ON CONFLICT (scope_key, date_part)
                 DO UPDATE SET last_sequence = last_sequence + 1
                 WHERE last_sequence < ?3
                 RETURNING last_sequence",
                params![scope_key, date_part, limit],
                |row| row.get(0),
            )
            .optional()?;
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            // Dropping `tx` rolls the bump back.
            return Err(deadline_passed());
        }
        tx.commit()?;
        Ok(next)
    }

    fn current(&self, scope_key: &str, date_part: &str) -> Result<u32> {
        let conn = self.connect()?;
        let value: Option<u32> = conn
            .query_row(
                "SELECT last_sequence FROM document_counters
                 WHERE scope_key = ?1 AND date_part = ?2",
                params![scope_key, date_part],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }
}

impl SchemaStore for SqliteStore {
    fn fetch(&self, template_name: &str) -> Result<Option<StoredSchema>> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                &format!("{SELECT_SCHEMA} WHERE template_name = ?1"),
                params![template_name],
                row_to_schema,
            )
            .optional()?;
        Ok(record)
    }

    fn fetch_all(&self) -> Result<Vec<StoredSchema>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_SCHEMA} ORDER BY template_name"))?;
        let records = stmt
            .query_map([], row_to_schema)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn insert(&self, record: StoredSchema) -> Result<()> {
        let column = encode_field_definitions(
            &record.field_definitions.into_storage(self.field_storage)?,
        )?;
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO form_schemas
                (template_name, description, field_definitions, template_file_id,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.template_name,
                record.description,
                column,
                record.template_file_id,
                record.created_at,
                record.updated_at,
            ],
        );
        match inserted {
            Ok(_) => Ok(tx.commit()?),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::Conflict {
                    template_name: record.template_name,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn set_description(
        &self,
        template_name: &str,
        description: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<StoredSchema>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE form_schemas SET description = ?2, updated_at = ?3
             WHERE template_name = ?1",
            params![template_name, description, updated_at],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let record = tx.query_row(
            &format!("{SELECT_SCHEMA} WHERE template_name = ?1"),
            params![template_name],
            row_to_schema,
        )?;
        tx.commit()?;
        Ok(Some(record))
    }

    fn remove(&self, template_name: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM form_schemas WHERE template_name = ?1",
            params![template_name],
        )?;
        Ok(removed > 0)
    }
}

fn deadline_passed() -> Error {
    Error::StoreUnavailable("request deadline passed before the counter update committed".into())
}

fn row_to_schema(row: &Row<'_>) -> rusqlite::Result<StoredSchema> {
    let column: String = row.get(2)?;
    Ok(StoredSchema {
        template_name: row.get(0)?,
        description: row.get(1)?,
        field_definitions: decode_field_definitions(column),
        template_file_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// The column always holds JSON. A JSON string at the top level is the text
/// form; anything else is the structured form. A column that is not JSON at
/// all is surfaced as text and left for the registry to reject.
fn decode_field_definitions(column: String) -> RawFieldDefinitions {
    match serde_json::from_str::<Value>(&column) {
        Ok(Value::String(text)) => RawFieldDefinitions::Text(text),
        Ok(value) => RawFieldDefinitions::Structured(value),
        Err(_) => RawFieldDefinitions::Text(column),
    }
}

fn encode_field_definitions(raw: &RawFieldDefinitions) -> Result<String> {
    let encoded = match raw {
        RawFieldDefinitions::Structured(value) => serde_json::to_string(value),
        RawFieldDefinitions::Text(text) => serde_json::to_string(text),
    };
    encoded.map_err(|e| Error::InvalidInput(e.to_string()))
}
