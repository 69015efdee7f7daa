//! The persisted raffle record and its projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entry::POINTS_PER_ENTRY,
  prize::{Prize, PrizeTier},
};

/// One awarded prize slot. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleResult {
  pub prize_id:     String,
  /// Prize name at draw time.
  pub prize_name:   String,
  pub winner_uid:   String,
  pub winner_name:  String,
  pub winner_email: String,
  pub timestamp:    DateTime<Utc>,
}

/// The single raffle record for an event season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleConfiguration {
  pub points_per_entry: u32,
  pub prizes:           Vec<Prize>,
  /// Append-only result log.
  pub results:          Vec<RaffleResult>,
  /// `true` from (re)initialization until a successful roll.
  pub active:           bool,
  pub created_at:       DateTime<Utc>,
  /// Bumped by the store on every write; used to guard the roll write.
  #[serde(default)]
  pub version:          u64,
}

impl RaffleConfiguration {
  /// A fresh, active configuration with no results.
  pub fn fresh(prizes: Vec<Prize>, now: DateTime<Utc>) -> Self {
    Self {
      points_per_entry: POINTS_PER_ENTRY,
      prizes,
      results: Vec::new(),
      active: true,
      created_at: now,
      version: 0,
    }
  }

  /// Current tier of `prize_id`, or `Minor` if the prize is no longer in the
  /// catalog.
  pub fn tier_of(&self, prize_id: &str) -> PrizeTier {
    self
      .prizes
      .iter()
      .find(|p| p.id == prize_id)
      .map(|p| p.tier)
      .unwrap_or_default()
  }
}

/// School shown when a winner has none on file.
pub const UNKNOWN_SCHOOL: &str = "unknown";

/// A result as shown on the public winners page.
///
/// `prize_tier` is resolved against the catalog at read time, not at draw
/// time: editing a prize's tier regroups its past winners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRaffleWinner {
  pub prize_id:          String,
  pub prize_name:        String,
  pub prize_tier:        PrizeTier,
  pub winner_uid:        String,
  pub winner_first_name: String,
  pub winner_school:     String,
  pub timestamp:         DateTime<Utc>,
}

/// First whitespace-separated word of `name`, or `"Winner"`.
pub fn first_name(name: &str) -> &str {
  name.split_whitespace().next().unwrap_or("Winner")
}
