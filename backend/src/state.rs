//! Shared application state handed to every Actix handler.
//!
//! `AppState` is built once in `main.rs` from the [`Config`] and injected as
//! `web::Data`. Both services hold the same `SqliteStore` handle; the store
//! opens a connection per call, so cloning the state is cheap and handlers
//! never share a connection.

use crate::config::Config;
use crate::error::Result;
use crate::services::identifiers::generator::{IdentifierGenerator, ScopeMode};
use crate::services::schemas::registry::SchemaRegistry;
use crate::store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    /// Issues BOL / Sales Order numbers.
    pub identifiers: Arc<IdentifierGenerator<SqliteStore>>,

    /// Form schema registry.
    pub schemas: Arc<SchemaRegistry<SqliteStore>>,

    /// How a request's customer maps to an identifier scope.
    pub scope_mode: ScopeMode,

    /// Deadline given to each identifier request; also caps every lock wait.
    pub request_timeout: Duration,
}

impl AppState {
    /// Opens the store named by `config` and wires both services to it.
    pub fn from_config(config: &Config) -> Result<Self> {
        // No single lock wait may outlast a request.
        let busy_timeout = config.busy_timeout.min(config.request_timeout);
        let store = SqliteStore::open(&config.db_path, busy_timeout, config.field_storage)?;
        let identifiers = IdentifierGenerator::new(store.clone())
            .with_retry(config.max_attempts, config.retry_backoff);
        Ok(AppState {
            identifiers: Arc::new(identifiers),
            schemas: Arc::new(SchemaRegistry::new(store)),
            scope_mode: config.scope_mode,
            request_timeout: config.request_timeout,
        })
    }
}
