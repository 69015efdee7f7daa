//! raffle-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `RAFFLE_*`
//! environment overrides, opens the SQLite store, seeds the school directory,
//! and serves the raffle API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```sh
//! cargo run -p raffle-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use raffle_core::{Raffle, draw::DrawOptions, store::ScoreLedger};
use raffle_server::{AppState, ServerConfig, auth::AuthConfig};
use raffle_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hour of Code raffle server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    println!("{}", hash_password(&read_password()?)?);
    return Ok(());
  }

  let server_cfg = load_config(cli.config)?;
  let store = open_store(&server_cfg).await?;

  let options = DrawOptions { one_win_per_person: server_cfg.one_win_per_person };
  let state = AppState {
    raffle: Arc::new(Raffle::new(store, options)),
    auth:   Arc::new(AuthConfig {
      username:      server_cfg.auth_username.clone(),
      password_hash: server_cfg.auth_password_hash.clone(),
    }),
  };

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(
    one_win_per_person = options.one_win_per_person,
    "raffle server listening on http://{address}"
  );

  axum::serve(listener, raffle_server::router(state))
    .await
    .context("server error")
}

/// `config.toml` layered under `RAFFLE_*` environment variables.
fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("RAFFLE"))
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("invalid server configuration")
}

/// Open the SQLite store and seed the school directory from config.
async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;

  for school in &cfg.schools {
    store
      .put_school(school.clone())
      .await
      .with_context(|| format!("failed to seed school {}", school.id))?;
  }
  if !cfg.schools.is_empty() {
    tracing::info!(count = cfg.schools.len(), "school directory seeded");
  }
  Ok(store)
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
