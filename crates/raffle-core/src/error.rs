//! Error types for `raffle-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("raffle not configured")]
  ConfigurationMissing,

  #[error("no raffle entries available")]
  NoEntries,

  #[error("raffle is already initialized")]
  AlreadyInitialized,

  #[error("raffle has already been rolled")]
  RaffleClosed,

  /// The configuration changed between reading it and writing the results.
  #[error("raffle configuration changed while rolling; nothing was recorded")]
  RollConflict,

  #[error("invalid prize catalog: {0}")]
  InvalidCatalog(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  /// The award would take the user's category or overall total past the
  /// range of an `i64`.
  #[error("score out of range for user {0}")]
  ScoreOverflow(String),

  /// The entrants hold more tickets than the pool can count.
  #[error("too many raffle tickets to draw from")]
  TicketOverflow,

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
