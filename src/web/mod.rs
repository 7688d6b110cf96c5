//! HTTP surface for the ledger.

pub mod routes;
pub mod server;

use crate::core::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub use routes::{router, AppState};
pub use server::serve;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Ledger(LedgerError),
    Input(String),
    Unauthorized(String),
}

impl From<LedgerError> for WebError {
    fn from(err: LedgerError) -> Self {
        WebError::Ledger(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Ledger(e @ LedgerError::InvalidDate(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string(), "invalid_input")
            }
            WebError::Ledger(LedgerError::Validation(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg, "validation")
            }
            WebError::Ledger(LedgerError::AuthFailed(msg)) => {
                (StatusCode::UNAUTHORIZED, msg, "unauthorized")
            }
            WebError::Ledger(e @ LedgerError::OwnerExists(_)) => {
                (StatusCode::CONFLICT, e.to_string(), "conflict")
            }
            WebError::Ledger(e @ LedgerError::OwnerNotFound(_)) => {
                (StatusCode::NOT_FOUND, e.to_string(), "not_found")
            }
            WebError::Ledger(LedgerError::Conflict(msg)) => (StatusCode::CONFLICT, msg, "conflict"),
            WebError::Ledger(LedgerError::IoError(msg))
            | WebError::Ledger(LedgerError::SerializationError(msg))
            | WebError::Ledger(LedgerError::Internal(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal")
            }
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "invalid_input"),
            WebError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "unauthorized"),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
