//! Handler errors and their HTTP status mapping.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why a request failed. Rendered as `{"error": "..."}` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<raffle_core::Error> for ApiError {
  fn from(e: raffle_core::Error) -> Self {
    use raffle_core::Error as E;
    match e {
      E::ConfigurationMissing | E::UserNotFound(_) => Self::NotFound(e.to_string()),
      E::NoEntries | E::TicketOverflow => Self::Unprocessable(e.to_string()),
      E::InvalidCatalog(_) | E::ScoreOverflow(_) => Self::BadRequest(e.to_string()),
      E::AlreadyInitialized | E::RaffleClosed | E::RollConflict => {
        Self::Conflict(e.to_string())
      }
      E::Persistence(inner) => Self::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
