use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::DeleteSchemaResponse;
use std::sync::Arc;

/// Actix web handler for `DELETE /api/schemas/{template_name}`.
///
/// Deleting a schema that does not exist is not an error: the answer is
/// `200 OK` with `{"deleted": false}`.
pub async fn process(
    state: web::Data<AppState>,
    template_name: web::Path<String>,
) -> impl Responder {
    let registry = Arc::clone(&state.schemas);
    let template_name = template_name.into_inner();
    match run_blocking(move || {
        registry.delete_schema(&template_name)
    })
    .await
    {
        Ok(deleted) => HttpResponse::Ok().json(DeleteSchemaResponse { deleted }),
        Err(e) => e.error_response(),
    }
}
