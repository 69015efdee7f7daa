//! Plain-text rendering for command output.

use chrono::{DateTime, Local, Utc};
use raffle_core::{
  entry::RaffleEntry,
  ledger::UserRecord,
  prize::{Prize, total_slots},
  raffle::{PublicRaffleWinner, RaffleConfiguration, RaffleResult},
};

fn local(ts: &DateTime<Utc>) -> String {
  ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn config(config: &RaffleConfiguration) {
  println!(
    "status:           {}",
    if config.active { "open" } else { "closed" }
  );
  println!("points per entry: {}", config.points_per_entry);
  println!("created:          {}", local(&config.created_at));
  println!("results:          {}", config.results.len());
  println!();
  prizes(&config.prizes);
}

pub fn prizes(prizes: &[Prize]) {
  println!("{:<24} {:<28} {:>4}  TIER", "ID", "NAME", "QTY");
  for p in prizes {
    println!("{:<24} {:<28} {:>4}  {}", p.id, p.name, p.quantity, p.tier);
  }
  println!("{} slot(s)", total_slots(prizes));
}

pub fn entries(entries: &[RaffleEntry]) {
  if entries.is_empty() {
    println!("no raffle entries");
    return;
  }
  println!("{:>7} {:>7}  {:<24} EMAIL", "TICKETS", "POINTS", "NAME");
  for e in entries {
    println!(
      "{:>7} {:>7}  {:<24} {}",
      e.entry_count, e.total_points, e.display_name, e.email
    );
  }
  let tickets = entries
    .iter()
    .fold(0u64, |acc, e| acc.saturating_add(e.entry_count));
  println!("{} entrant(s), {tickets} ticket(s)", entries.len());
}

pub fn results(results: &[RaffleResult]) {
  if results.is_empty() {
    println!("no results");
    return;
  }
  for r in results {
    println!(
      "{}  {:<28} {} <{}>",
      local(&r.timestamp),
      r.prize_name,
      r.winner_name,
      r.winner_email
    );
  }
}

pub fn winners(winners: &[PublicRaffleWinner]) {
  if winners.is_empty() {
    println!("no winners yet");
    return;
  }
  for w in winners {
    println!(
      "[{}] {:<28} {} ({})",
      w.prize_tier, w.prize_name, w.winner_first_name, w.winner_school
    );
  }
}

pub fn user(user: &UserRecord) {
  println!("id:     {}", user.user_id);
  println!("name:   {}", user.display_name.as_deref().unwrap_or("-"));
  println!("email:  {}", user.email.as_deref().unwrap_or("-"));
  println!("school: {}", user.school.as_deref().unwrap_or("-"));
  for (category, points) in &user.scores {
    println!("  {category:<12} {points:>6}");
  }
  println!("  {:<12} {:>6}", "total", user.total_points());
}
