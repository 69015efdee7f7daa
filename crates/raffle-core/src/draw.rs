//! The draw engine.
//!
//! Every ticket in the pool has the same chance of being drawn, so a user's
//! odds are proportional to their ticket count. Prizes are filled in catalog
//! order; each drawn ticket leaves the pool before the next draw.
//!
//! The pool is a Fenwick tree over per-entry ticket counts rather than a flat
//! list with one slot per ticket, so memory is proportional to the number of
//! entrants and each draw is `O(log n)`.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entry::RaffleEntry,
  prize::Prize,
  raffle::RaffleResult,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// What leaves the pool when a ticket wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOptions {
  /// `false`: only the drawn ticket is removed, so a user's other tickets
  /// stay eligible and one user may win several slots.
  /// `true`: all of the winner's tickets are removed on their first win.
  #[serde(default)]
  pub one_win_per_person: bool,
}

// ─── Ticket pool ─────────────────────────────────────────────────────────────

/// Remaining tickets, grouped by entry.
#[derive(Debug, Clone)]
pub struct TicketPool {
  /// Tickets left per entry, indexed like the entry slice.
  remaining: Vec<u64>,
  /// 1-indexed Fenwick tree over `remaining`.
  tree:      Vec<u64>,
  len:       u64,
}

impl TicketPool {
  /// Fails with [`Error::TicketOverflow`] if the total ticket count does not
  /// fit in a `u64`.
  pub fn new(entries: &[RaffleEntry]) -> Result<Self> {
    let len = entries
      .iter()
      .try_fold(0u64, |acc, e| acc.checked_add(e.entry_count))
      .ok_or(Error::TicketOverflow)?;

    let n = entries.len();
    let mut pool = Self {
      remaining: vec![0; n],
      tree:      vec![0; n + 1],
      len,
    };
    // Every tree node is a partial sum of `len`, so none can overflow.
    for (i, entry) in entries.iter().enumerate() {
      pool.add(i, entry.entry_count);
    }
    Ok(pool)
  }

  /// Total tickets left.
  pub fn len(&self) -> u64 { self.len }

  pub fn is_empty(&self) -> bool { self.len == 0 }

  /// Tickets left for entry `index`.
  pub fn tickets_of(&self, index: usize) -> u64 {
    self.remaining.get(index).copied().unwrap_or(0)
  }

  /// The entry holding ticket number `ticket`, counting tickets in entry
  /// order. `None` if `ticket >= len()`.
  pub fn owner_of(&self, ticket: u64) -> Option<usize> {
    if ticket >= self.len {
      return None;
    }
    let n = self.remaining.len();
    let mut pos = 0;
    let mut rest = ticket;
    let mut step = n.checked_ilog2().map_or(0, |b| 1usize << b);
    while step > 0 {
      let next = pos + step;
      if next <= n && self.tree[next] <= rest {
        pos = next;
        rest -= self.tree[next];
      }
      step >>= 1;
    }
    Some(pos)
  }

  /// Pick one remaining ticket uniformly at random and return its owner.
  pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
    if self.is_empty() {
      return None;
    }
    self.owner_of(rng.gen_range(0..self.len))
  }

  /// Remove a single ticket belonging to entry `index`.
  pub fn remove_ticket(&mut self, index: usize) {
    if self.tickets_of(index) > 0 {
      self.sub(index, 1);
    }
  }

  /// Remove every ticket belonging to entry `index`.
  pub fn remove_entry(&mut self, index: usize) {
    let count = self.tickets_of(index);
    if count > 0 {
      self.sub(index, count);
    }
  }

  fn add(&mut self, index: usize, amount: u64) {
    self.remaining[index] += amount;
    let mut i = index + 1;
    while i < self.tree.len() {
      self.tree[i] += amount;
      i += i & i.wrapping_neg();
    }
  }

  fn sub(&mut self, index: usize, amount: u64) {
    self.remaining[index] -= amount;
    self.len -= amount;
    let mut i = index + 1;
    while i < self.tree.len() {
      self.tree[i] -= amount;
      i += i & i.wrapping_neg();
    }
  }
}

// ─── Roll ────────────────────────────────────────────────────────────────────

/// Draw winners for every slot of every prize in `catalog`.
///
/// Fails with [`Error::NoEntries`] if `entries` hold no tickets at all. If the
/// pool runs dry part-way through, the remaining slots stay unfilled and the
/// results drawn so far are returned.
pub fn roll<R: Rng + ?Sized>(
  catalog: &[Prize],
  entries: &[RaffleEntry],
  options: DrawOptions,
  rng: &mut R,
  now: DateTime<Utc>,
) -> Result<Vec<RaffleResult>> {
  let mut pool = TicketPool::new(entries)?;
  if pool.is_empty() {
    return Err(Error::NoEntries);
  }

  let mut results = Vec::new();

  'prizes: for prize in catalog {
    for _ in 0..prize.quantity {
      let Some(winner) = pool.draw(rng) else {
        break 'prizes;
      };
      let entry = &entries[winner];

      results.push(RaffleResult {
        prize_id:     prize.id.clone(),
        prize_name:   prize.name.clone(),
        winner_uid:   entry.user_id.clone(),
        winner_name:  entry.display_name.clone(),
        winner_email: entry.email.clone(),
        timestamp:    now,
      });

      if options.one_win_per_person {
        pool.remove_entry(winner);
      } else {
        pool.remove_ticket(winner);
      }
    }
  }

  Ok(results)
}
