//! SQL schema for the raffle SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- At most one row: the raffle for the current season.
CREATE TABLE IF NOT EXISTS raffle_config (
    singleton         INTEGER PRIMARY KEY CHECK (singleton = 1),
    points_per_entry  INTEGER NOT NULL,
    prizes_json       TEXT    NOT NULL,   -- JSON array of prizes, catalog order
    active            INTEGER NOT NULL,   -- 0 | 1
    created_at        TEXT    NOT NULL,   -- RFC 3339 UTC
    version           INTEGER NOT NULL    -- bumped on every write
);

-- Append-only between resets. Rows are only deleted when the whole
-- configuration is replaced.
CREATE TABLE IF NOT EXISTS raffle_results (
    result_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    prize_id      TEXT NOT NULL,
    prize_name    TEXT NOT NULL,
    winner_uid    TEXT NOT NULL,
    winner_name   TEXT NOT NULL,
    winner_email  TEXT NOT NULL,
    drawn_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    display_name  TEXT,
    email         TEXT,
    school        TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scores (
    user_id   TEXT    NOT NULL REFERENCES users(user_id),
    category  TEXT    NOT NULL,
    points    INTEGER NOT NULL,
    PRIMARY KEY (user_id, category)
);

CREATE TABLE IF NOT EXISTS schools (
    school_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL
);

PRAGMA user_version = 1;
";
