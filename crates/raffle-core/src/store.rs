//! Storage traits.
//!
//! [`RaffleConfigStore`] owns the single [`RaffleConfiguration`] record;
//! [`ScoreLedger`] exposes the scoring ledger and school directory. Storage
//! backends (e.g. `raffle-store-sqlite`) implement both. Higher layers go
//! through [`Raffle`](crate::Raffle), never through the traits directly.

use std::{collections::HashMap, future::Future};

use crate::{
  ledger::{Award, NewUser, School, UserRecord},
  prize::Prize,
  raffle::{RaffleConfiguration, RaffleResult},
};

// ─── Configuration record ────────────────────────────────────────────────────

/// Persistence for the singleton raffle configuration.
///
/// Every write is atomic and bumps the record's `version`.
pub trait RaffleConfigStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the configuration together with its full result log. `None` if it
  /// was never created.
  fn load_config(
    &self,
  ) -> impl Future<Output = Result<Option<RaffleConfiguration>, Self::Error>> + Send + '_;

  /// Persist `config`, including `config.results`, only if no configuration
  /// exists yet. Returns the stored record, or `None` if one already existed
  /// (and was left untouched).
  fn insert_config(
    &self,
    config: RaffleConfiguration,
  ) -> impl Future<Output = Result<Option<RaffleConfiguration>, Self::Error>> + Send + '_;

  /// Unconditionally replace the configuration. The stored result log is
  /// replaced by `config.results` (empty for a reset).
  fn replace_config(
    &self,
    config: RaffleConfiguration,
  ) -> impl Future<Output = Result<RaffleConfiguration, Self::Error>> + Send + '_;

  /// Replace the prize catalog only. Returns `false` if no configuration
  /// exists.
  fn update_prizes(
    &self,
    prizes: Vec<Prize>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Append `results` and mark the raffle inactive, but only if the stored
  /// `version` still equals `expected_version` and the raffle is still
  /// active. Returns `false` (having written nothing) otherwise.
  fn append_results(
    &self,
    expected_version: u64,
    results: Vec<RaffleResult>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Scoring ledger ──────────────────────────────────────────────────────────

/// Read access to user scores and school names, plus the write operations the
/// score-awarding subsystems use.
pub trait ScoreLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every user with their current scores.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  fn get_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// Create a user, or update the profile fields of an existing one.
  fn upsert_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Users among `user_ids` that exist, in any order. Unknown ids are skipped.
  fn get_users<'a>(
    &'a self,
    user_ids: &'a [String],
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + 'a;

  /// Add `amount` to the user's `category` score, creating the category at 0.
  /// The range check (see [`apply_award`](crate::ledger::apply_award)) and
  /// the write happen atomically.
  fn award_points<'a>(
    &'a self,
    user_id: &'a str,
    category: &'a str,
    amount: i64,
  ) -> impl Future<Output = Result<Award, Self::Error>> + Send + 'a;

  /// Display names for the known ids among `school_ids`, keyed by id.
  fn school_names<'a>(
    &'a self,
    school_ids: &'a [String],
  ) -> impl Future<Output = Result<HashMap<String, String>, Self::Error>> + Send + 'a;

  /// Register or rename a school.
  fn put_school(
    &self,
    school: School,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
