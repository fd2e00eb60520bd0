//! # Document Identifier Service
//!
//! Issues Bill-of-Lading / Sales Order numbers (`YYYYMMDD` + 3-digit daily
//! sequence) through the [`generator::IdentifierGenerator`], and exposes it over
//! HTTP for the document-generation flow.
//!
//! ## Sub-modules:
//! - `generator`: numbering rules, scope selection and bounded retry.
//! - `next`: handler that issues the next number for a customer and date.

pub mod generator;
mod next;

use actix_web::web::{post, scope};
use actix_web::Scope;

/// The base path for all identifier endpoints.
const API_PATH: &str = "/api/identifiers";

/// Configures and returns the Actix `Scope` for identifier routes.
///
/// # Registered Routes:
///
/// *   **`POST /next`**:
///     - **Handler**: `next::process`
///     - **Description**: Issues the next document number. The JSON body may carry a
///       `customer_id` (used when numbering is scoped per customer) and a `date`
///       (`YYYY-MM-DD`, defaults to today).
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/next", post().to(next::process))
}
