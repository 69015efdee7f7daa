//! [`SqliteStore`]: the SQLite implementation of the raffle storage traits.

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, Transaction};

use raffle_core::{
  ledger::{Award, NewUser, School, UserRecord, apply_award},
  prize::Prize,
  raffle::{RaffleConfiguration, RaffleResult},
  store::{RaffleConfigStore, ScoreLedger},
};

use crate::{
  Error, Result,
  encode::{
    RawConfig, RawResult, RawUser, decode_version, encode_dt, encode_prizes,
    encode_version,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A raffle store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write a raw configuration row directly. Used by tests to simulate
  /// records written by older versions.
  #[cfg(test)]
  pub(crate) async fn write_raw_config(&self, prizes_json: &str) -> Result<()> {
    let prizes_json = prizes_json.to_owned();
    let created_at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO raffle_config
             (singleton, points_per_entry, prizes_json, active, created_at, version)
           VALUES (1, 10, ?1, 1, ?2, 1)",
          rusqlite::params![prizes_json, created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const SELECT_CONFIG: &str = "SELECT points_per_entry, prizes_json, active, created_at, version
   FROM raffle_config WHERE singleton = 1";

const SELECT_RESULTS: &str = "SELECT prize_id, prize_name, winner_uid, winner_name, winner_email, drawn_at
   FROM raffle_results ORDER BY result_id";

fn read_config(conn: &Connection) -> rusqlite::Result<Option<RawConfig>> {
  conn
    .query_row(SELECT_CONFIG, [], |row| {
      Ok(RawConfig {
        points_per_entry: row.get(0)?,
        prizes_json:      row.get(1)?,
        active:           row.get(2)?,
        created_at:       row.get(3)?,
        version:          row.get(4)?,
      })
    })
    .optional()
}

fn read_results(conn: &Connection) -> rusqlite::Result<Vec<RawResult>> {
  let mut stmt = conn.prepare(SELECT_RESULTS)?;
  let rows = stmt
    .query_map([], |row| {
      Ok(RawResult {
        prize_id:     row.get(0)?,
        prize_name:   row.get(1)?,
        winner_uid:   row.get(2)?,
        winner_name:  row.get(3)?,
        winner_email: row.get(4)?,
        drawn_at:     row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn write_config(tx: &Transaction<'_>, raw: &RawConfig) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT OR REPLACE INTO raffle_config
       (singleton, points_per_entry, prizes_json, active, created_at, version)
     VALUES (1, ?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      raw.points_per_entry,
      raw.prizes_json,
      raw.active,
      raw.created_at,
      raw.version,
    ],
  )?;
  Ok(())
}

fn insert_results(tx: &Transaction<'_>, results: &[RawResult]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO raffle_results
       (prize_id, prize_name, winner_uid, winner_name, winner_email, drawn_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;
  for r in results {
    stmt.execute(rusqlite::params![
      r.prize_id,
      r.prize_name,
      r.winner_uid,
      r.winner_name,
      r.winner_email,
      r.drawn_at,
    ])?;
  }
  Ok(())
}

fn read_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawUser>> {
  let user = conn
    .query_row(
      "SELECT user_id, display_name, email, school, created_at
       FROM users WHERE user_id = ?1",
      rusqlite::params![user_id],
      |row| {
        Ok(RawUser {
          user_id:      row.get(0)?,
          display_name: row.get(1)?,
          email:        row.get(2)?,
          school:       row.get(3)?,
          created_at:   row.get(4)?,
          scores:       Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut user) = user else {
    return Ok(None);
  };

  let mut stmt =
    conn.prepare("SELECT category, points FROM scores WHERE user_id = ?1")?;
  user.scores = stmt
    .query_map(rusqlite::params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(user))
}

// ─── RaffleConfigStore impl ──────────────────────────────────────────────────

impl RaffleConfigStore for SqliteStore {
  type Error = Error;

  async fn load_config(&self) -> Result<Option<RaffleConfiguration>> {
    let raw = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let loaded = match read_config(&tx)? {
          Some(config) => Some((config, read_results(&tx)?)),
          None => None,
        };
        tx.commit()?;
        Ok(loaded)
      })
      .await?;

    raw
      .map(|(config, results)| config.into_config(results))
      .transpose()
  }

  async fn insert_config(
    &self,
    mut config: RaffleConfiguration,
  ) -> Result<Option<RaffleConfiguration>> {
    config.version = 1;
    let raw = RawConfig::from_config(&config)?;
    let results: Vec<RawResult> =
      config.results.iter().map(RawResult::from_result).collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if read_config(&tx)?.is_some() {
          return Ok(false);
        }
        tx.execute("DELETE FROM raffle_results", [])?;
        write_config(&tx, &raw)?;
        insert_results(&tx, &results)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(config))
  }

  async fn replace_config(
    &self,
    mut config: RaffleConfiguration,
  ) -> Result<RaffleConfiguration> {
    let results: Vec<RawResult> =
      config.results.iter().map(RawResult::from_result).collect();
    let mut raw = RawConfig::from_config(&config)?;

    let version = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: i64 = tx
          .query_row(
            "SELECT version FROM raffle_config WHERE singleton = 1",
            [],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);
        raw.version = current + 1;
        tx.execute("DELETE FROM raffle_results", [])?;
        write_config(&tx, &raw)?;
        insert_results(&tx, &results)?;
        tx.commit()?;
        Ok(raw.version)
      })
      .await?;

    config.version = decode_version(version)?;
    Ok(config)
  }

  async fn update_prizes(&self, prizes: Vec<Prize>) -> Result<bool> {
    let prizes_json = encode_prizes(&prizes)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE raffle_config
           SET prizes_json = ?1, version = version + 1
           WHERE singleton = 1",
          rusqlite::params![prizes_json],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn append_results(
    &self,
    expected_version: u64,
    results: Vec<RaffleResult>,
  ) -> Result<bool> {
    let expected = encode_version(expected_version)?;
    let results: Vec<RawResult> = results.iter().map(RawResult::from_result).collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let claimed = tx.execute(
          "UPDATE raffle_config
           SET active = 0, version = version + 1
           WHERE singleton = 1 AND version = ?1 AND active = 1",
          rusqlite::params![expected],
        )?;
        if claimed == 0 {
          // Dropping the transaction rolls it back.
          return Ok(false);
        }
        insert_results(&tx, &results)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(written)
  }
}

// ─── ScoreLedger impl ────────────────────────────────────────────────────────

impl ScoreLedger for SqliteStore {
  type Error = Error;

  async fn list_users(&self) -> Result<Vec<UserRecord>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let mut users = {
          let mut stmt = tx.prepare(
            "SELECT user_id, display_name, email, school, created_at
             FROM users ORDER BY user_id",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(RawUser {
                user_id:      row.get(0)?,
                display_name: row.get(1)?,
                email:        row.get(2)?,
                school:       row.get(3)?,
                created_at:   row.get(4)?,
                scores:       Vec::new(),
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };

        let scores = {
          let mut stmt =
            tx.prepare("SELECT user_id, category, points FROM scores")?;
          let rows = stmt
            .query_map([], |row| {
              Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
              ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        tx.commit()?;

        for (user_id, category, points) in scores {
          if let Ok(i) = users.binary_search_by(|u| u.user_id.as_str().cmp(&user_id)) {
            users[i].scores.push((category, points));
          }
        }
        Ok(users)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
    let user_id = user_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, &user_id)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn get_users(&self, user_ids: &[String]) -> Result<Vec<UserRecord>> {
    let user_ids = user_ids.to_vec();
    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut users = Vec::with_capacity(user_ids.len());
        for user_id in &user_ids {
          if let Some(raw) = read_user(&tx, user_id)? {
            users.push(raw);
          }
        }
        tx.commit()?;
        Ok(users)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn upsert_user(&self, user: NewUser) -> Result<UserRecord> {
    let created_at = encode_dt(Utc::now());
    let user_id = user.user_id.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, display_name, email, school, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id) DO UPDATE SET
             display_name = excluded.display_name,
             email        = excluded.email,
             school       = excluded.school",
          rusqlite::params![
            user.user_id,
            user.display_name,
            user.email,
            user.school,
            created_at,
          ],
        )?;
        let raw = read_user(&tx, &user.user_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(Error::MissingRow(user_id))?
      .into_user()
  }

  async fn award_points(
    &self,
    user_id: &str,
    category: &str,
    amount: i64,
  ) -> Result<Award> {
    let user_id = user_id.to_owned();
    let category = category.to_owned();

    let award = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(user) = read_user(&tx, &user_id)? else {
          return Ok(Award::UnknownUser);
        };

        // Summed in Rust: SQLite's SUM raises on overflow.
        let total = user
          .scores
          .iter()
          .fold(0i64, |acc, (_, p)| acc.saturating_add(*p));
        let current = user
          .scores
          .iter()
          .find(|(c, _)| *c == category)
          .map_or(0, |(_, p)| *p);
        let Some(new_points) = apply_award(current, total, amount) else {
          return Ok(Award::OutOfRange);
        };

        tx.execute(
          "INSERT INTO scores (user_id, category, points) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id, category) DO UPDATE SET
             points = excluded.points",
          rusqlite::params![user_id, category, new_points],
        )?;
        tx.commit()?;
        Ok(Award::Applied(new_points))
      })
      .await?;

    Ok(award)
  }

  async fn school_names(&self, school_ids: &[String]) -> Result<HashMap<String, String>> {
    let school_ids = school_ids.to_vec();
    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT name FROM schools WHERE school_id = ?1")?;
        let mut names = HashMap::with_capacity(school_ids.len());
        for id in school_ids {
          let name: Option<String> = stmt
            .query_row(rusqlite::params![id], |r| r.get(0))
            .optional()?;
          if let Some(name) = name {
            names.insert(id, name);
          }
        }
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn put_school(&self, school: School) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schools (school_id, name) VALUES (?1, ?2)
           ON CONFLICT (school_id) DO UPDATE SET name = excluded.name",
          rusqlite::params![school.id, school.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
