//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. The prize catalog is stored as
//! a compact JSON array so that fields added later (like `tier`) decode with
//! their serde defaults on old rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use raffle_core::{
  ledger::UserRecord,
  prize::Prize,
  raffle::{RaffleConfiguration, RaffleResult},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Prizes ──────────────────────────────────────────────────────────────────

pub fn encode_prizes(prizes: &[Prize]) -> Result<String> {
  Ok(serde_json::to_string(prizes)?)
}

pub fn decode_prizes(s: &str) -> Result<Vec<Prize>> { Ok(serde_json::from_str(s)?) }

// ─── Version ─────────────────────────────────────────────────────────────────

pub fn encode_version(v: u64) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::OutOfRange(format!("version {v}")))
}

pub fn decode_version(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::OutOfRange(format!("version {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from the `raffle_config` row.
pub struct RawConfig {
  pub points_per_entry: u32,
  pub prizes_json:      String,
  pub active:           bool,
  pub created_at:       String,
  pub version:          i64,
}

impl RawConfig {
  pub fn into_config(self, results: Vec<RawResult>) -> Result<RaffleConfiguration> {
    Ok(RaffleConfiguration {
      points_per_entry: self.points_per_entry,
      prizes:           decode_prizes(&self.prizes_json)?,
      results:          results
        .into_iter()
        .map(RawResult::into_result)
        .collect::<Result<_>>()?,
      active:           self.active,
      created_at:       decode_dt(&self.created_at)?,
      version:          decode_version(self.version)?,
    })
  }

  pub fn from_config(config: &RaffleConfiguration) -> Result<Self> {
    Ok(Self {
      points_per_entry: config.points_per_entry,
      prizes_json:      encode_prizes(&config.prizes)?,
      active:           config.active,
      created_at:       encode_dt(config.created_at),
      version:          encode_version(config.version)?,
    })
  }
}

/// Raw values of a `raffle_results` row.
pub struct RawResult {
  pub prize_id:     String,
  pub prize_name:   String,
  pub winner_uid:   String,
  pub winner_name:  String,
  pub winner_email: String,
  pub drawn_at:     String,
}

impl RawResult {
  pub fn into_result(self) -> Result<RaffleResult> {
    Ok(RaffleResult {
      prize_id:     self.prize_id,
      prize_name:   self.prize_name,
      winner_uid:   self.winner_uid,
      winner_name:  self.winner_name,
      winner_email: self.winner_email,
      timestamp:    decode_dt(&self.drawn_at)?,
    })
  }

  pub fn from_result(r: &RaffleResult) -> Self {
    Self {
      prize_id:     r.prize_id.clone(),
      prize_name:   r.prize_name.clone(),
      winner_uid:   r.winner_uid.clone(),
      winner_name:  r.winner_name.clone(),
      winner_email: r.winner_email.clone(),
      drawn_at:     encode_dt(r.timestamp),
    }
  }
}

/// Raw values of a `users` row plus its `scores` rows.
pub struct RawUser {
  pub user_id:      String,
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub school:       Option<String>,
  pub created_at:   String,
  pub scores:       Vec<(String, i64)>,
}

impl RawUser {
  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:      self.user_id,
      display_name: self.display_name,
      email:        self.email,
      school:       self.school,
      scores:       self.scores.into_iter().collect::<BTreeMap<_, _>>(),
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
