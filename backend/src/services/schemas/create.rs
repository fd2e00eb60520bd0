use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::CreateSchemaRequest;
use std::sync::Arc;

/// Actix web handler for `POST /api/schemas`.
///
/// Called by the extraction pipeline when a template has no schema yet.
/// Answers `201 Created` with the new schema, or `409 Conflict` if one already
/// exists (regenerating requires deleting it first).
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateSchemaRequest>,
) -> impl Responder {
    let registry = Arc::clone(&state.schemas);
    let request = payload.into_inner();
    match run_blocking(move || {
        registry.create_schema_for_file(
            &request.template_name,
            request.field_definitions,
            &request.description,
            request.template_file_id.as_deref(),
        )
    })
    .await
    {
        Ok(schema) => HttpResponse::Created().json(schema),
        Err(e) => e.error_response(),
    }
}
