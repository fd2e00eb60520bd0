//! # Form Schema Service Module
//!
//! This module holds the schema registry and routes every request under
//! `/api/schemas` to the matching handler.
//!
//! ## Sub-modules:
//! - `registry`: create/read/update-description/delete rules for form schemas.
//! - `normalize`: turns stored rows (structured JSON or serialized text) into `FormSchema`.
//! - `list`, `get`, `create`, `update`, `delete`: the HTTP handlers.

mod create;
mod delete;
mod get;
mod list;
pub mod normalize;
pub mod registry;
mod update;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

/// The base path for all schema-related API endpoints.
const API_PATH: &str = "/api/schemas";

/// Configures and returns the Actix `Scope` for all schema routes.
///
/// # Registered Routes:
///
/// *   **`GET /`**: `list::process`, every schema; malformed ones are flagged per item.
/// *   **`POST /`**: `create::process`, registers a new schema (`409` if the name exists).
/// *   **`GET /{template_name}`**: `get::process`, one normalized schema.
/// *   **`PUT /{template_name}/description`**: `update::process`, edits the description only.
/// *   **`DELETE /{template_name}`**: `delete::process`, answers `{"deleted": bool}`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/{template_name}", get().to(get::process))
        .route("/{template_name}", delete().to(delete::process))
        .route("/{template_name}/description", put().to(update::process))
}
