//! The scoring ledger as seen by the raffle.
//!
//! Scores are written by the article, quiz, and game subsystems. The raffle
//! only ever reads the per-user sum.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used for every game-awarded point.
pub const GAMES_CATEGORY: &str = "games";

/// A participant and their per-category scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub user_id:      String,
  pub display_name: Option<String>,
  pub email:        Option<String>,
  /// School identifier; resolved to a display name via the school directory.
  pub school:       Option<String>,
  #[serde(default)]
  pub scores:       BTreeMap<String, i64>,
  pub created_at:   DateTime<Utc>,
}

impl UserRecord {
  /// Sum of every score category. Negative values are summed as-is; the sum
  /// saturates at the bounds of `i64`.
  pub fn total_points(&self) -> i64 {
    self.scores.values().fold(0i64, |acc, &v| acc.saturating_add(v))
  }
}

/// Input to [`ScoreLedger::upsert_user`](crate::store::ScoreLedger::upsert_user).
/// Existing scores are never touched by an upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub user_id:      String,
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub school:       Option<String>,
}

/// Outcome of [`ScoreLedger::award_points`](crate::store::ScoreLedger::award_points).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Award {
  /// Written; carries the category's new total.
  Applied(i64),
  UnknownUser,
  /// The category or the user's overall total would leave the `i64` range.
  /// Nothing was written.
  OutOfRange,
}

/// The category total after adding `amount`, or `None` if either that total
/// or the user's overall total would overflow.
pub fn apply_award(category_points: i64, total_points: i64, amount: i64) -> Option<i64> {
  total_points.checked_add(amount)?;
  category_points.checked_add(amount)
}

/// A school known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
  pub id:   String,
  pub name: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_points_sums_all_categories() {
    let user = UserRecord {
      user_id:      "u1".into(),
      display_name: None,
      email:        None,
      school:       None,
      scores:       BTreeMap::from([
        (GAMES_CATEGORY.to_string(), 12),
        ("intro-python".to_string(), 30),
        ("penalty".to_string(), -5),
      ]),
      created_at:   Utc::now(),
    };
    assert_eq!(user.total_points(), 37);
  }

  #[test]
  fn total_points_saturates() {
    let big = i64::MAX / 2 + 1;
    let mut user = UserRecord {
      user_id:      "u1".into(),
      display_name: None,
      email:        None,
      school:       None,
      scores:       BTreeMap::from([
        (GAMES_CATEGORY.to_string(), big),
        ("intro-python".to_string(), big),
      ]),
      created_at:   Utc::now(),
    };
    assert_eq!(user.total_points(), i64::MAX);

    user.scores = BTreeMap::from([
      ("a".to_string(), i64::MIN),
      ("b".to_string(), -1),
    ]);
    assert_eq!(user.total_points(), i64::MIN);
  }

  #[test]
  fn awards_past_either_bound_are_refused() {
    let big = i64::MAX / 2 + 1;
    assert_eq!(apply_award(0, 0, big), Some(big));
    // Category fits, overall total does not.
    assert_eq!(apply_award(0, big, big), None);
    assert_eq!(apply_award(i64::MAX, i64::MAX, 1), None);
    assert_eq!(apply_award(i64::MIN, i64::MIN, -1), None);
    assert_eq!(apply_award(i64::MAX, i64::MAX, -5), Some(i64::MAX - 5));
  }
}
