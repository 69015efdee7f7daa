//! `raffle`: admin console for the Hour of Code raffle.
//!
//! # Usage
//!
//! ```sh
//! raffle --url http://localhost:8080 --user admin --password secret entries
//! raffle --config ~/.config/raffle/config.toml roll
//! ```

mod client;
mod print;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Profile};
use raffle_core::{ledger::GAMES_CATEGORY, prize::NewPrize};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "raffle", about = "Admin console for the Hour of Code raffle")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the raffle server (default: http://localhost:8080).
  #[arg(long, env = "RAFFLE_URL")]
  url: Option<String>,

  /// Admin username.
  #[arg(long, env = "RAFFLE_USER")]
  user: Option<String>,

  /// Admin password (plaintext).
  #[arg(long, env = "RAFFLE_PASSWORD", hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the raffle configuration.
  Config,
  /// List entrants and their ticket counts.
  Entries,
  /// Create the raffle configuration.
  Init {
    /// TOML file with `[[prizes]]` tables; default catalog if omitted.
    #[arg(long, value_name = "FILE")]
    prizes: Option<PathBuf>,
  },
  /// Show the prize catalog, or replace it with `--set`.
  Prizes {
    /// TOML file with `[[prizes]]` tables.
    #[arg(long, value_name = "FILE")]
    set: Option<PathBuf>,
  },
  /// Draw winners for every prize.
  Roll,
  /// Show the full result log.
  Results,
  /// Show winners as published on the public page.
  Winners,
  /// Discard all results and start over.
  Reset {
    /// TOML file with `[[prizes]]` tables; default catalog if omitted.
    #[arg(long, value_name = "FILE")]
    prizes: Option<PathBuf>,
    /// Confirm that existing results will be discarded.
    #[arg(long)]
    yes: bool,
  },
  /// Add points to a user's category total.
  Award {
    user_id: String,
    #[arg(allow_negative_numbers = true)]
    amount: i64,
    #[arg(long, default_value = GAMES_CATEGORY)]
    category: String,
  },
  /// Show a user, or update their profile when any field is given.
  User {
    user_id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    school: Option<String>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file. Every key may be overridden by
/// the matching flag or environment variable.
#[derive(Deserialize, Default)]
struct ConfigFile {
  url:      Option<String>,
  username: Option<String>,
  password: Option<String>,
}

fn read_config_file(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

/// Shape of a prize catalog file.
#[derive(Deserialize)]
struct PrizeFile {
  #[serde(default)]
  prizes: Vec<NewPrize>,
}

fn read_prizes(path: Option<&Path>) -> Result<Vec<NewPrize>> {
  let Some(path) = path else {
    return Ok(Vec::new());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading prize file {}", path.display()))?;
  let file: PrizeFile = toml::from_str(&raw)
    .with_context(|| format!("parsing prize file {}", path.display()))?;
  Ok(file.prizes)
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg = read_config_file(args.config.as_deref())?;
  let api_config = ApiConfig {
    base_url: args
      .url
      .or(file_cfg.url)
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: args.user.or(file_cfg.username).unwrap_or_default(),
    password: args.password.or(file_cfg.password).unwrap_or_default(),
  };
  tracing::debug!(url = %api_config.base_url, "connecting");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Config => match client.config().await? {
      Some(config) => print::config(&config),
      None => println!("raffle not configured"),
    },
    Command::Entries => print::entries(&client.entries().await?),
    Command::Init { prizes } => {
      let prizes = read_prizes(prizes.as_deref())?;
      let config = client.initialize(prizes).await?;
      print::config(&config);
    }
    Command::Prizes { set: None } => print::prizes(&client.prizes().await?),
    Command::Prizes { set: Some(path) } => {
      let prizes = read_prizes(Some(&path))?;
      let config = client.save_prizes(prizes).await?;
      print::prizes(&config.prizes);
    }
    Command::Roll => {
      let results = client.roll().await?;
      println!("{} prize(s) awarded", results.len());
      print::results(&results);
    }
    Command::Results => print::results(&client.results().await?),
    Command::Winners => print::winners(&client.winners().await?),
    Command::Reset { prizes, yes } => {
      if !yes {
        bail!("reset discards every recorded winner; re-run with --yes");
      }
      let prizes = read_prizes(prizes.as_deref())?;
      let config = client.reset(prizes).await?;
      print::config(&config);
    }
    Command::Award { user_id, amount, category } => {
      let award = client.award(&user_id, &category, amount).await?;
      println!("{user_id}: {} = {}", award.category, award.total);
    }
    Command::User { user_id, name, email, school } => {
      let user = if name.is_none() && email.is_none() && school.is_none() {
        client.user(&user_id).await?
      } else {
        let profile = Profile { display_name: name, email, school };
        client.upsert_user(&user_id, &profile).await?
      };
      print::user(&user);
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use raffle_core::prize::{Prize, PrizeTier};

  #[test]
  fn prize_file_parses_optional_fields() {
    let file: PrizeFile = toml::from_str(
      r#"
        [[prizes]]
        id       = "ipad"
        name     = "iPad"
        quantity = 1
        tier     = "major"

        [[prizes]]
        name     = "Sticker pack"
        quantity = 25
      "#,
    )
    .unwrap();

    let prizes: Vec<Prize> = file.prizes.into_iter().map(Prize::from).collect();
    assert_eq!(prizes[0].id, "ipad");
    assert_eq!(prizes[0].tier, PrizeTier::Major);
    assert!(prizes[1].id.starts_with("custom-"));
    assert_eq!(prizes[1].tier, PrizeTier::Minor);
    assert_eq!(prizes[1].description, "");
  }

  #[test]
  fn missing_prize_file_means_default_catalog() {
    assert!(read_prizes(None).unwrap().is_empty());
  }

  #[test]
  fn award_accepts_negative_amounts() {
    let args = Args::try_parse_from(["raffle", "award", "u1", "-5"]).unwrap();
    match args.command {
      Command::Award { user_id, amount, category } => {
        assert_eq!(user_id, "u1");
        assert_eq!(amount, -5);
        assert_eq!(category, GAMES_CATEGORY);
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn config_file_keys_are_optional() {
    let cfg: ConfigFile = toml::from_str(r#"url = "https://raffle.example.org""#).unwrap();
    assert_eq!(cfg.url.as_deref(), Some("https://raffle.example.org"));
    assert!(cfg.username.is_none());
    assert!(cfg.password.is_none());
  }
}
