//! Persistence backend seams.
//!
//! The core talks to storage through two narrow traits: an atomic per-(scope,
//! date) counter for document numbers, and a keyed record store for form
//! schemas. `SqliteStore` implements both.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;
use std::time::Instant;

/// How a store writes `field_definitions` for new records.
///
/// Hosted databases have handed the same schema back either as a native JSON
/// value or as a JSON string holding serialized text; both are supported so
/// either kind of history can be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldStorage {
    #[default]
    Structured,
    Text,
}

impl FromStr for FieldStorage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(FieldStorage::Structured),
            "text" => Ok(FieldStorage::Text),
            other => Err(Error::InvalidInput(format!(
                "unknown field storage '{other}', expected 'structured' or 'text'"
            ))),
        }
    }
}

/// `field_definitions` exactly as the store found it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFieldDefinitions {
    Structured(Value),
    Text(String),
}

impl RawFieldDefinitions {
    /// Converts a structured value to the representation `storage` asks for.
    /// Text is left as is: the store never interprets it.
    pub fn into_storage(self, storage: FieldStorage) -> Result<Self> {
        match (self, storage) {
            (RawFieldDefinitions::Structured(value), FieldStorage::Text) => {
                let text = serde_json::to_string(&value)
                    .map_err(|e| Error::InvalidInput(e.to_string()))?;
                Ok(RawFieldDefinitions::Text(text))
            }
            (raw, _) => Ok(raw),
        }
    }
}

/// A schema row before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSchema {
    pub template_name: String,
    pub description: String,
    pub field_definitions: RawFieldDefinitions,
    pub template_file_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub trait CounterStore: Send + Sync {
    /// Atomically bumps the counter for `(scope_key, date_part)` and returns
    /// the new value. Returns `None`, leaving the counter untouched, when the
    /// bump would go past `limit`.
    ///
    /// With a `deadline`, waiting for the store stops when it passes, and a
    /// bump that would only commit after it is rolled back with
    /// `StoreUnavailable`. An `Err` never consumes a value.
    fn increment(
        &self,
        scope_key: &str,
        date_part: &str,
        limit: u32,
        deadline: Option<Instant>,
    ) -> Result<Option<u32>>;

    /// Last value handed out for `(scope_key, date_part)`, or 0.
    fn current(&self, scope_key: &str, date_part: &str) -> Result<u32>;
}

pub trait SchemaStore: Send + Sync {
    fn fetch(&self, template_name: &str) -> Result<Option<StoredSchema>>;

    /// Every record, ordered by `template_name`.
    fn fetch_all(&self) -> Result<Vec<StoredSchema>>;

    /// Inserts a new record; `Error::Conflict` if the name is taken.
    fn insert(&self, record: StoredSchema) -> Result<()>;

    /// Rewrites description and `updated_at` of an existing record and returns
    /// it. Never inserts: `None` when no record has that name.
    fn set_description(
        &self,
        template_name: &str,
        description: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<StoredSchema>>;

    /// `true` if a record was removed.
    fn remove(&self, template_name: &str) -> Result<bool>;
}
