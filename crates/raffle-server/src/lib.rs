//! HTTP server for the raffle.
//!
//! Mounts the public and admin API routers from [`raffle_api`], guards the
//! admin half with HTTP Basic auth, and wraps everything in request tracing.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use raffle_core::{
  Raffle,
  ledger::School,
  store::{RaffleConfigStore, ScoreLedger},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RAFFLE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Remove a winner's remaining tickets after their first prize.
  #[serde(default)]
  pub one_win_per_person: bool,
  /// School directory seeded into the store at startup.
  #[serde(default)]
  pub schools:            Vec<School>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state handed to [`router`].
pub struct AppState<S> {
  pub raffle: Arc<Raffle<S>>,
  pub auth:   Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { raffle: self.raffle.clone(), auth: self.auth.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// | Prefix | Auth |
/// |--------|------|
/// | `/health` | none |
/// | `/api` | none |
/// | `/api/admin` | HTTP Basic |
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RaffleConfigStore + ScoreLedger + 'static,
{
  let admin = raffle_api::admin_router(state.raffle.clone()).layer(
    middleware::from_fn_with_state(state.auth.clone(), auth::require_admin),
  );

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api/admin", admin)
    .nest("/api", raffle_api::public_router(state.raffle))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use raffle_core::draw::DrawOptions;
  use raffle_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .put_school(School {
        id:   "lincoln".to_string(),
        name: "Lincoln Elementary".to_string(),
      })
      .await
      .unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      raffle: Arc::new(Raffle::new(store, DrawOptions::default())),
      auth:   Arc::new(AuthConfig {
        username:      "admin".to_string(),
        password_hash: hash,
      }),
    }
  }

  fn admin_auth() -> String {
    format!("Basic {}", B64.encode("admin:secret"))
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    authed: bool,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if authed {
      builder = builder.header(header::AUTHORIZATION, admin_auth());
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp   = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value  = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn enroll(state: &AppState<SqliteStore>, id: &str, name: &str, points: i64) {
    let (status, _) = send(
      state,
      "PUT",
      &format!("/api/admin/users/{id}"),
      true,
      Some(json!({
        "display_name": name,
        "email": format!("{id}@example.com"),
        "school": "lincoln",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
      state,
      "POST",
      &format!("/api/admin/users/{id}/points"),
      true,
      Some(json!({ "category": "games", "amount": points })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], points);
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let state = make_state("secret").await;
    let req   = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp  = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn admin_routes_require_auth() {
    let state = make_state("secret").await;
    let (status, _) = send(&state, "POST", "/api/admin/raffle/roll", false, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&state, "GET", "/api/admin/raffle/entries", false, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn unauthorized_carries_challenge() {
    let state = make_state("secret").await;
    let req = Request::builder()
      .method("GET")
      .uri("/api/admin/raffle")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn public_prizes_default_before_initialize() {
    let state = make_state("secret").await;
    let (status, body) = send(&state, "GET", "/api/raffle/prizes", false, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["ipad", "jbl", "giftcard"]);
  }

  // ── Raffle flow ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unconfigured_raffle_is_null_and_roll_is_404() {
    let state = make_state("secret").await;
    let (status, body) = send(&state, "GET", "/api/admin/raffle", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = send(&state, "POST", "/api/admin/raffle/roll", true, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn initialize_roll_and_publish() {
    let state = make_state("secret").await;
    enroll(&state, "u1", "Ada Lovelace", 30).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/admin/raffle/initialize",
      true,
      Some(json!({ "prizes": [
        { "id": "pen", "name": "Pen", "quantity": 2, "tier": "major" }
      ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["points_per_entry"], 10);
    assert_eq!(body["active"], true);

    let (status, body) = send(&state, "GET", "/api/admin/raffle/entries", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["entry_count"], 3);

    let (status, body) = send(&state, "POST", "/api/admin/raffle/roll", true, None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["winner_uid"] == "u1"));

    let (status, body) = send(&state, "GET", "/api/raffle/winners", false, None).await;
    assert_eq!(status, StatusCode::OK);
    let winners = body.as_array().unwrap();
    assert_eq!(winners.len(), 2);
    assert_eq!(winners[0]["winner_first_name"], "Ada");
    assert_eq!(winners[0]["winner_school"], "Lincoln Elementary");
    assert_eq!(winners[0]["prize_tier"], "major");
    assert!(winners[0].get("winner_email").is_none());
  }

  #[tokio::test]
  async fn empty_pool_roll_is_422_and_raffle_stays_open() {
    let state = make_state("secret").await;
    let (status, _) = send(&state, "POST", "/api/admin/raffle/initialize", true, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&state, "POST", "/api/admin/raffle/roll", true, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (_, body) = send(&state, "GET", "/api/admin/raffle", true, None).await;
    assert_eq!(body["active"], true);
    let (_, body) = send(&state, "GET", "/api/admin/raffle/results", true, None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn double_initialize_conflicts() {
    let state = make_state("secret").await;
    let (status, _) = send(&state, "POST", "/api/admin/raffle/initialize", true, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&state, "POST", "/api/admin/raffle/initialize", true, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn invalid_catalog_is_bad_request() {
    let state = make_state("secret").await;
    let (status, _) = send(
      &state,
      "PUT",
      "/api/admin/raffle/prizes",
      true,
      Some(json!([{ "id": "x", "name": "X", "quantity": 0 }])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn saving_prizes_retiers_published_winners() {
    let state = make_state("secret").await;
    enroll(&state, "u1", "Grace Hopper", 10).await;
    send(
      &state,
      "POST",
      "/api/admin/raffle/initialize",
      true,
      Some(json!({ "prizes": [{ "id": "mug", "name": "Mug", "quantity": 1 }] })),
    )
    .await;
    let (status, _) = send(&state, "POST", "/api/admin/raffle/roll", true, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&state, "GET", "/api/raffle/winners", false, None).await;
    assert_eq!(body[0]["prize_tier"], "minor");

    let (status, _) = send(
      &state,
      "PUT",
      "/api/admin/raffle/prizes",
      true,
      Some(json!([{ "id": "mug", "name": "Mug", "quantity": 1, "tier": "major" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&state, "GET", "/api/raffle/winners", false, None).await;
    assert_eq!(body[0]["prize_tier"], "major");
    let (_, body) = send(&state, "GET", "/api/admin/raffle/results", true, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn reset_discards_results() {
    let state = make_state("secret").await;
    enroll(&state, "u1", "Alan Turing", 50).await;
    send(&state, "POST", "/api/admin/raffle/initialize", true, None).await;
    let (_, body) = send(&state, "POST", "/api/admin/raffle/roll", true, None).await;
    assert!(!body.as_array().unwrap().is_empty());

    let (status, body) = send(&state, "POST", "/api/admin/raffle/reset", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    let (_, body) = send(&state, "GET", "/api/raffle/winners", false, None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn points_for_unknown_user_is_404() {
    let state = make_state("secret").await;
    let (status, _) = send(
      &state,
      "POST",
      "/api/admin/users/ghost/points",
      true,
      Some(json!({ "category": "games", "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn award_past_score_range_is_400() {
    let state = make_state("secret").await;
    let half = i64::MAX / 2 + 1;
    enroll(&state, "big", "Grace Hopper", half).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/admin/users/big/points",
      true,
      Some(json!({ "category": "intro", "amount": half })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&state, "GET", "/api/admin/raffle/entries", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["total_points"], half);
  }
}
