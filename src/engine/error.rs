//! Typed engine errors with an HTTP status mapping, per spec §7.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("no station available")]
    NoStationAvailable,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidState(_) => StatusCode::BAD_REQUEST,
            EngineError::NoStationAvailable => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) => StatusCode::BAD_REQUEST,
            EngineError::AuthRequired => StatusCode::UNAUTHORIZED,
            EngineError::Forbidden => StatusCode::FORBIDDEN,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        EngineError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
