pub mod identifiers;
pub mod schemas;

use crate::error::{Error, Result};

/// Runs a store call on Tokio's blocking pool and waits for its outcome.
///
/// The call is never abandoned: whatever it reports is what the caller sees,
/// so a write that commits is never answered as a failure. Callers bound its
/// running time through the store (busy timeout, deadlines), not here.
pub(crate) async fn run_blocking<T, F>(call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|join_error| Error::StoreUnavailable(format!("store call aborted: {join_error}")))?
}
