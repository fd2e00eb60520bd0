use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::UpdateDescriptionRequest;
use std::sync::Arc;

/// Actix web handler for `PUT /api/schemas/{template_name}/description`.
///
/// Only the description is editable; the body carries nothing else. Answers
/// `404 Not Found` rather than creating a schema that does not exist.
pub async fn process(
    state: web::Data<AppState>,
    template_name: web::Path<String>,
    payload: web::Json<UpdateDescriptionRequest>,
) -> impl Responder {
    let registry = Arc::clone(&state.schemas);
    let template_name = template_name.into_inner();
    let description = payload.into_inner().description;
    match run_blocking(move || {
        registry.update_description(&template_name, &description)
    })
    .await
    {
        Ok(schema) => HttpResponse::Ok().json(schema),
        Err(e) => e.error_response(),
    }
}
