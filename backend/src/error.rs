//! Error type shared by the identifier generator, the schema registry and the
//! store backends.
//!
//! Every kind maps to its own HTTP status and machine-readable `error` code so
//! callers can tell a missing schema from an exhausted sequence without parsing
//! messages.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("form schema '{template_name}' not found")]
    NotFound { template_name: String },

    #[error("form schema '{template_name}' already exists; delete it before regenerating")]
    Conflict { template_name: String },

    #[error("form schema '{template_name}' has malformed field definitions: {reason}")]
    MalformedSchema {
        template_name: String,
        reason: String,
    },

    #[error(
        "all {limit} identifiers for scope '{scope_key}' on {date_part} are used; \
         pick another scope or date"
    )]
    SequenceExhausted {
        scope_key: String,
        date_part: String,
        limit: u16,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Only store outages are worth retrying; everything else is a caller or
    /// data problem that a retry would repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Conflict { .. } => "conflict",
            Error::MalformedSchema { .. } => "malformed_schema",
            Error::SequenceExhausted { .. } => "sequence_exhausted",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } | Error::SequenceExhausted { .. } => StatusCode::CONFLICT,
            Error::MalformedSchema { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}
