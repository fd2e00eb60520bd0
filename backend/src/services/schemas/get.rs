use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use std::sync::Arc;

/// Actix web handler for `GET /api/schemas/{template_name}`.
///
/// # Returns
/// - `200 OK` with the normalized `FormSchema`.
/// - `404 Not Found` if no schema has that name.
/// - `422 Unprocessable Entity` if its stored field definitions cannot be decoded.
pub async fn process(
    state: web::Data<AppState>,
    template_name: web::Path<String>,
) -> impl Responder {
    let registry = Arc::clone(&state.schemas);
    let template_name = template_name.into_inner();
    match run_blocking(move || {
        registry.get_schema(&template_name)
    })
    .await
    {
        Ok(schema) => HttpResponse::Ok().json(schema),
        Err(e) => e.error_response(),
    }
}
