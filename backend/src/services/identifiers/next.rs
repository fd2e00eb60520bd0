use crate::error::Result;
use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Local;
use common::model::identifier::DocumentIdentifier;
use common::requests::NextIdentifierRequest;
use std::sync::Arc;
use std::time::Instant;

/// Actix web handler for `POST /api/identifiers/next`.
///
/// Returns `200 OK` with the issued `DocumentIdentifier`, or the error's own
/// status (`409` once the day's sequence is used up, `503` when the store is
/// unreachable or stays locked past the request timeout; a `503` never uses
/// up a number).
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<NextIdentifierRequest>,
) -> impl Responder {
    match next_identifier(&state, payload.into_inner()).await {
        Ok(id) => HttpResponse::Ok().json(id),
        Err(e) => e.error_response(),
    }
}

async fn next_identifier(
    state: &AppState,
    request: NextIdentifierRequest,
) -> Result<DocumentIdentifier> {
    let scope_key = state.scope_mode.resolve(request.customer_id.as_deref())?;
    let date = request.date.unwrap_or_else(|| Local::now().date_naive());
    let deadline = Instant::now() + state.request_timeout;
    let generator = Arc::clone(&state.identifiers);
    run_blocking(move || generator.next_identifier_before(&scope_key, date, deadline)).await
}
