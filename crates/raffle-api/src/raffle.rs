//! Handlers for `/raffle` endpoints.
//!
//! Public:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/raffle/prizes` | Current catalog (default catalog if unconfigured) |
//! | `GET`  | `/raffle/winners` | [`PublicRaffleWinner`]s, current tiers |
//!
//! Admin:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/raffle` | Configuration or `null` |
//! | `POST` | `/raffle/initialize` | Body: [`CatalogBody`]; 201, or 409 if already initialized |
//! | `PUT`  | `/raffle/prizes` | Body: `[NewPrize]`; results and active flag untouched |
//! | `GET`  | `/raffle/entries` | Entrants, most tickets first |
//! | `POST` | `/raffle/roll` | Draws and records winners |
//! | `GET`  | `/raffle/results` | Full result log |
//! | `POST` | `/raffle/reset` | Body: [`CatalogBody`]; discards all results |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use raffle_core::{
  Raffle,
  entry::{RaffleEntry, sort_for_display},
  prize::{NewPrize, Prize, default_catalog},
  raffle::{PublicRaffleWinner, RaffleConfiguration, RaffleResult},
  store::{RaffleConfigStore, ScoreLedger},
};
use serde::Deserialize;

use crate::error::ApiError;

/// Body accepted by initialize and reset. Omitting `prizes` (or sending an
/// empty list) selects the default catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogBody {
  #[serde(default)]
  pub prizes: Vec<NewPrize>,
}

fn into_catalog(prizes: Vec<NewPrize>) -> Vec<Prize> {
  prizes.into_iter().map(Prize::from).collect()
}

// ─── Public ──────────────────────────────────────────────────────────────────

/// `GET /raffle/prizes`
pub async fn prizes<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Vec<Prize>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  let prizes = raffle
    .get_configuration()
    .await?
    .map_or_else(default_catalog, |c| c.prizes);
  Ok(Json(prizes))
}

/// `GET /raffle/winners`
pub async fn winners<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Vec<PublicRaffleWinner>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  Ok(Json(raffle.get_public_results().await?))
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// `GET /raffle`
pub async fn config<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Option<RaffleConfiguration>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  Ok(Json(raffle.get_configuration().await?))
}

/// `POST /raffle/initialize`
pub async fn initialize<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  body: Option<Json<CatalogBody>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let config = raffle.initialize(into_catalog(body.prizes)).await?;
  tracing::info!(prizes = config.prizes.len(), "raffle initialized");
  Ok((StatusCode::CREATED, Json(config)))
}

/// `PUT /raffle/prizes`
pub async fn save_prizes<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  Json(prizes): Json<Vec<NewPrize>>,
) -> Result<Json<RaffleConfiguration>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  let config = raffle.update_prize_catalog(into_catalog(prizes)).await?;
  tracing::info!(prizes = config.prizes.len(), "prize catalog saved");
  Ok(Json(config))
}

/// `GET /raffle/entries`
pub async fn entries<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Vec<RaffleEntry>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  let mut entries = raffle.list_entries().await?;
  sort_for_display(&mut entries);
  Ok(Json(entries))
}

/// `POST /raffle/roll`
pub async fn roll<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Vec<RaffleResult>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  match raffle.roll().await {
    Ok(results) => {
      tracing::info!(winners = results.len(), "raffle rolled");
      Ok(Json(results))
    }
    Err(e) => {
      tracing::warn!(error = %e, "raffle roll failed");
      Err(e.into())
    }
  }
}

/// `GET /raffle/results`
pub async fn results<S>(
  State(raffle): State<Arc<Raffle<S>>>,
) -> Result<Json<Vec<RaffleResult>>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  Ok(Json(raffle.get_results().await?))
}

/// `POST /raffle/reset`
pub async fn reset<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  body: Option<Json<CatalogBody>>,
) -> Result<Json<RaffleConfiguration>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let config = raffle.reset(into_catalog(body.prizes)).await?;
  tracing::warn!("raffle reset; previous results discarded");
  Ok(Json(config))
}
