//! Handlers for `/users` endpoints (admin only).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/users/{id}` | Body: `{"display_name":..,"email":..,"school":..}` |
//! | `GET`  | `/users/{id}` | 404 if not found |
//! | `POST` | `/users/{id}/points` | Body: `{"category":"games","amount":10}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use raffle_core::{
  Raffle,
  ledger::{NewUser, UserRecord},
  store::{RaffleConfigStore, ScoreLedger},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Profile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub school:       Option<String>,
}

/// `PUT /users/{id}`
pub async fn upsert<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  Path(user_id): Path<String>,
  Json(body): Json<ProfileBody>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  if user_id.trim().is_empty() {
    return Err(ApiError::BadRequest("user id must not be empty".into()));
  }
  let user = raffle
    .upsert_user(NewUser {
      user_id,
      display_name: body.display_name,
      email: body.email,
      school: body.school,
    })
    .await?;
  Ok(Json(user))
}

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  raffle
    .get_user(&user_id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))
}

// ─── Points ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AwardBody {
  pub category: String,
  pub amount:   i64,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
  pub category: String,
  pub total:    i64,
}

/// `POST /users/{id}/points`
pub async fn award<S>(
  State(raffle): State<Arc<Raffle<S>>>,
  Path(user_id): Path<String>,
  Json(body): Json<AwardBody>,
) -> Result<Json<AwardResponse>, ApiError>
where
  S: RaffleConfigStore + ScoreLedger,
{
  if body.category.trim().is_empty() {
    return Err(ApiError::BadRequest("category must not be empty".into()));
  }
  let total = raffle
    .award_points(&user_id, &body.category, body.amount)
    .await?;
  tracing::info!(%user_id, category = %body.category, amount = body.amount, total, "points awarded");
  Ok(Json(AwardResponse { category: body.category, total }))
}
