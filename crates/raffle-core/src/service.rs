//! [`Raffle`]: the operations exposed to the admin console and public pages.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
  Error, Result,
  draw::{self, DrawOptions},
  entry::{POINTS_PER_ENTRY, RaffleEntry, build_entries},
  ledger::{Award, NewUser, UserRecord},
  prize::{Prize, normalize_catalog, validate_catalog},
  raffle::{
    PublicRaffleWinner, RaffleConfiguration, RaffleResult, UNKNOWN_SCHOOL,
    first_name,
  },
  store::{RaffleConfigStore, ScoreLedger},
};

/// The raffle service. Cheap to share behind an `Arc`; holds no state of its
/// own beyond the store handle and draw options.
#[derive(Debug, Clone)]
pub struct Raffle<S> {
  store:   S,
  options: DrawOptions,
}

impl<S> Raffle<S>
where
  S: RaffleConfigStore + ScoreLedger,
{
  pub fn new(store: S, options: DrawOptions) -> Self { Self { store, options } }

  pub fn store(&self) -> &S { &self.store }

  pub fn options(&self) -> DrawOptions { self.options }

  // ── Configuration ─────────────────────────────────────────────────────────

  /// Create the configuration with `prizes` (the default catalog if empty).
  ///
  /// Fails with [`Error::AlreadyInitialized`] if one exists; use
  /// [`Raffle::reset`] to replace it.
  pub async fn initialize(&self, prizes: Vec<Prize>) -> Result<RaffleConfiguration> {
    let prizes = prepare_catalog(prizes)?;
    self
      .store
      .insert_config(RaffleConfiguration::fresh(prizes, Utc::now()))
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::AlreadyInitialized)
  }

  /// The current configuration, or `None` if the raffle was never set up.
  pub async fn get_configuration(&self) -> Result<Option<RaffleConfiguration>> {
    let config = self
      .store
      .load_config()
      .await
      .map_err(Error::persistence)?;
    Ok(config.map(|mut c| {
      c.prizes = normalize_catalog(c.prizes);
      c
    }))
  }

  /// Replace the prize catalog without touching results or the active flag.
  /// Creates the configuration if there is none yet.
  pub async fn update_prize_catalog(
    &self,
    prizes: Vec<Prize>,
  ) -> Result<RaffleConfiguration> {
    let prizes = prepare_catalog(prizes)?;

    let updated = self
      .store
      .update_prizes(prizes.clone())
      .await
      .map_err(Error::persistence)?;

    if !updated {
      let inserted = self
        .store
        .insert_config(RaffleConfiguration::fresh(prizes.clone(), Utc::now()))
        .await
        .map_err(Error::persistence)?;
      if let Some(config) = inserted {
        return Ok(config);
      }
      // Lost a race with another writer creating the record.
      self
        .store
        .update_prizes(prizes)
        .await
        .map_err(Error::persistence)?;
    }

    self
      .get_configuration()
      .await?
      .ok_or(Error::ConfigurationMissing)
  }

  /// Replace the configuration outright: results are discarded and the raffle
  /// becomes active again.
  pub async fn reset(&self, prizes: Vec<Prize>) -> Result<RaffleConfiguration> {
    let prizes = prepare_catalog(prizes)?;
    self
      .store
      .replace_config(RaffleConfiguration::fresh(prizes, Utc::now()))
      .await
      .map_err(Error::persistence)
  }

  // ── Entries ───────────────────────────────────────────────────────────────

  /// Everyone holding at least one ticket, computed from the live ledger.
  pub async fn list_entries(&self) -> Result<Vec<RaffleEntry>> {
    let points_per_entry = self
      .store
      .load_config()
      .await
      .map_err(Error::persistence)?
      .map_or(POINTS_PER_ENTRY, |c| c.points_per_entry);
    self.entries_at(points_per_entry).await
  }

  async fn entries_at(&self, points_per_entry: u32) -> Result<Vec<RaffleEntry>> {
    let users = self.store.list_users().await.map_err(Error::persistence)?;
    Ok(build_entries(&users, points_per_entry))
  }

  // ── Roll ──────────────────────────────────────────────────────────────────

  /// Draw winners with an entropy-seeded generator.
  pub async fn roll(&self) -> Result<Vec<RaffleResult>> {
    let mut rng = StdRng::from_entropy();
    self.roll_with_rng(&mut rng).await
  }

  /// Draw winners for the current catalog from the current ledger, then
  /// record them and close the raffle in one conditional write.
  ///
  /// Nothing is written on failure. If the configuration changed after it was
  /// read (a concurrent roll, reset, or prize edit), the draw is discarded and
  /// [`Error::RollConflict`] is returned.
  pub async fn roll_with_rng<R: Rng + Send>(
    &self,
    rng: &mut R,
  ) -> Result<Vec<RaffleResult>> {
    let config = self
      .store
      .load_config()
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::ConfigurationMissing)?;

    if !config.active {
      return Err(Error::RaffleClosed);
    }

    let version = config.version;
    let prizes = normalize_catalog(config.prizes);
    let entries = self.entries_at(config.points_per_entry).await?;

    let results = draw::roll(&prizes, &entries, self.options, rng, Utc::now())?;
    if results.is_empty() {
      return Ok(results);
    }

    let written = self
      .store
      .append_results(version, results.clone())
      .await
      .map_err(Error::persistence)?;

    if written { Ok(results) } else { Err(Error::RollConflict) }
  }

  // ── Results ───────────────────────────────────────────────────────────────

  /// The full result log, oldest first.
  pub async fn get_results(&self) -> Result<Vec<RaffleResult>> {
    Ok(
      self
        .get_configuration()
        .await?
        .map(|c| c.results)
        .unwrap_or_default(),
    )
  }

  /// The result log as shown publicly: first names, schools, and each
  /// prize's *current* tier.
  pub async fn get_public_results(&self) -> Result<Vec<PublicRaffleWinner>> {
    let Some(config) = self.get_configuration().await? else {
      return Ok(Vec::new());
    };

    let schools = self.winner_schools(&config.results).await?;

    Ok(
      config
        .results
        .iter()
        .map(|r| PublicRaffleWinner {
          prize_id:          r.prize_id.clone(),
          prize_name:        r.prize_name.clone(),
          prize_tier:        config.tier_of(&r.prize_id),
          winner_uid:        r.winner_uid.clone(),
          winner_first_name: first_name(&r.winner_name).to_string(),
          winner_school:     schools
            .get(&r.winner_uid)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SCHOOL.to_string()),
          timestamp:         r.timestamp,
        })
        .collect(),
    )
  }

  /// School display name per winner uid: the directory name, else the raw
  /// school id. Winners with no school on file are absent. Two ledger reads
  /// regardless of how many winners there are.
  async fn winner_schools(
    &self,
    results: &[RaffleResult],
  ) -> Result<HashMap<String, String>> {
    let uids: Vec<String> = results
      .iter()
      .map(|r| r.winner_uid.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    if uids.is_empty() {
      return Ok(HashMap::new());
    }

    let school_of: HashMap<String, String> = self
      .store
      .get_users(&uids)
      .await
      .map_err(Error::persistence)?
      .into_iter()
      .filter_map(|u| Some((u.user_id, u.school.filter(|s| !s.is_empty())?)))
      .collect();

    let school_ids: Vec<String> = school_of
      .values()
      .cloned()
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let names = self
      .store
      .school_names(&school_ids)
      .await
      .map_err(Error::persistence)?;

    Ok(
      school_of
        .into_iter()
        .map(|(uid, school_id)| {
          let name = names.get(&school_id).cloned().unwrap_or(school_id);
          (uid, name)
        })
        .collect(),
    )
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
    self.store.get_user(user_id).await.map_err(Error::persistence)
  }

  pub async fn upsert_user(&self, user: NewUser) -> Result<UserRecord> {
    self.store.upsert_user(user).await.map_err(Error::persistence)
  }

  /// Add points to a user's category; returns the category's new total.
  ///
  /// Fails with [`Error::ScoreOverflow`] if the category or the user's
  /// overall total would leave the `i64` range.
  pub async fn award_points(
    &self,
    user_id: &str,
    category: &str,
    amount: i64,
  ) -> Result<i64> {
    let award = self
      .store
      .award_points(user_id, category, amount)
      .await
      .map_err(Error::persistence)?;
    match award {
      Award::Applied(total) => Ok(total),
      Award::UnknownUser => Err(Error::UserNotFound(user_id.to_string())),
      Award::OutOfRange => Err(Error::ScoreOverflow(user_id.to_string())),
    }
  }
}

fn prepare_catalog(prizes: Vec<Prize>) -> Result<Vec<Prize>> {
  let prizes = normalize_catalog(prizes);
  validate_catalog(&prizes)?;
  Ok(prizes)
}
