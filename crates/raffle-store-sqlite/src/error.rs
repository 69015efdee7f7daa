//! Error type for `raffle-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("stored value out of range: {0}")]
  OutOfRange(String),

  /// A row written in the same transaction could not be read back.
  #[error("row missing after write: {0}")]
  MissingRow(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
