//! Entry pool builder: turns accumulated points into raffle tickets.

use serde::{Deserialize, Serialize};

use crate::ledger::UserRecord;

/// Points required for one ticket.
pub const POINTS_PER_ENTRY: u32 = 10;

/// A user's weighted participation in the draw. Derived on demand from the
/// scoring ledger; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleEntry {
  pub user_id:      String,
  pub display_name: String,
  pub email:        String,
  pub total_points: i64,
  /// `floor(total_points / points_per_entry)`; always at least 1.
  pub entry_count:  u64,
}

/// Number of tickets earned by `total_points`. Zero or negative totals earn
/// none.
pub fn entry_count(total_points: i64, points_per_entry: u32) -> u64 {
  if points_per_entry == 0 || total_points <= 0 {
    return 0;
  }
  (total_points / i64::from(points_per_entry)) as u64
}

/// Build the entry list for `users`. Users with no tickets are left out.
pub fn build_entries<'a, I>(users: I, points_per_entry: u32) -> Vec<RaffleEntry>
where
  I: IntoIterator<Item = &'a UserRecord>,
{
  users
    .into_iter()
    .filter_map(|user| {
      let total_points = user.total_points();
      let entry_count = entry_count(total_points, points_per_entry);
      (entry_count > 0).then(|| RaffleEntry {
        user_id: user.user_id.clone(),
        display_name: user
          .display_name
          .clone()
          .filter(|n| !n.is_empty())
          .unwrap_or_else(|| "Unknown".to_string()),
        email: user.email.clone().unwrap_or_default(),
        total_points,
        entry_count,
      })
    })
    .collect()
}

/// Sort for display: most tickets first, ties by name.
pub fn sort_for_display(entries: &mut [RaffleEntry]) {
  entries.sort_by(|a, b| {
    b.entry_count
      .cmp(&a.entry_count)
      .then_with(|| a.display_name.cmp(&b.display_name))
  });
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::Utc;

  use super::*;

  fn user(id: &str, scores: &[(&str, i64)]) -> UserRecord {
    UserRecord {
      user_id:      id.into(),
      display_name: Some(format!("User {id}")),
      email:        Some(format!("{id}@inst.example.org")),
      school:       None,
      scores:       scores
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect::<BTreeMap<_, _>>(),
      created_at:   Utc::now(),
    }
  }

  #[test]
  fn entry_count_floors() {
    assert_eq!(entry_count(0, 10), 0);
    assert_eq!(entry_count(9, 10), 0);
    assert_eq!(entry_count(10, 10), 1);
    assert_eq!(entry_count(25, 10), 2);
    assert_eq!(entry_count(100, 10), 10);
    assert_eq!(entry_count(-20, 10), 0);
  }

  #[test]
  fn users_below_threshold_are_excluded() {
    let users = vec![
      user("a", &[("games", 25)]),
      user("b", &[("games", 60), ("intro", 40)]),
      user("c", &[("games", 5)]),
      user("d", &[]),
    ];
    let entries = build_entries(&users, 10);
    let ids: Vec<_> = entries.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(entries[0].entry_count, 2);
    assert_eq!(entries[1].entry_count, 10);
    assert_eq!(entries[1].total_points, 100);
  }

  #[test]
  fn negative_scores_reduce_total() {
    let users = vec![user("a", &[("games", 30), ("adjust", -15)])];
    let entries = build_entries(&users, 10);
    assert_eq!(entries[0].total_points, 15);
    assert_eq!(entries[0].entry_count, 1);
  }

  #[test]
  fn missing_profile_fields_get_defaults() {
    let mut u = user("a", &[("games", 10)]);
    u.display_name = None;
    u.email = None;
    let entries = build_entries([&u], 10);
    assert_eq!(entries[0].display_name, "Unknown");
    assert_eq!(entries[0].email, "");
  }

  #[test]
  fn repeated_builds_are_identical() {
    let users = vec![user("a", &[("games", 42)]), user("b", &[("x", 7)])];
    assert_eq!(build_entries(&users, 10), build_entries(&users, 10));
  }

  #[test]
  fn display_sort_puts_most_tickets_first() {
    let users = vec![
      user("a", &[("games", 20)]),
      user("b", &[("games", 90)]),
      user("c", &[("games", 40)]),
    ];
    let mut entries = build_entries(&users, 10);
    sort_for_display(&mut entries);
    let ids: Vec<_> = entries.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(ids, ["b", "c", "a"]);
  }
}
