use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use std::sync::Arc;

/// Actix web handler for `GET /api/schemas`.
///
/// Always answers `200 OK` when the store is reachable; a schema that cannot be
/// decoded appears as `{"status": "malformed", ...}` next to the others.
pub async fn process(state: web::Data<AppState>) -> impl Responder {
    let registry = Arc::clone(&state.schemas);
    match run_blocking(move || registry.list_schemas()).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => e.error_response(),
    }
}
