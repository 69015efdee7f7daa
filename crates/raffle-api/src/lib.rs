//! JSON REST API for the raffle.
//!
//! Two axum [`Router`]s backed by a shared [`Raffle`] service: a public one
//! (prize catalog and winners) and an admin one (everything else). Auth is
//! the caller's responsibility; the admin router must be mounted behind it.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", raffle_api::public_router(raffle.clone()))
//! .nest("/api/admin", raffle_api::admin_router(raffle).layer(auth))
//! ```

pub mod error;
pub mod raffle;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use raffle_core::{
  Raffle,
  store::{RaffleConfigStore, ScoreLedger},
};

pub use error::ApiError;

/// Unauthenticated read-only routes.
pub fn public_router<S>(raffle: Arc<Raffle<S>>) -> Router<()>
where
  S: RaffleConfigStore + ScoreLedger + 'static,
{
  Router::new()
    .route("/raffle/prizes", get(raffle::prizes::<S>))
    .route("/raffle/winners", get(raffle::winners::<S>))
    .with_state(raffle)
}

/// Routes that change raffle state or expose entrant details.
pub fn admin_router<S>(raffle: Arc<Raffle<S>>) -> Router<()>
where
  S: RaffleConfigStore + ScoreLedger + 'static,
{
  Router::new()
    // Configuration
    .route("/raffle", get(raffle::config::<S>))
    .route("/raffle/initialize", post(raffle::initialize::<S>))
    .route("/raffle/prizes", put(raffle::save_prizes::<S>))
    .route("/raffle/reset", post(raffle::reset::<S>))
    // Drawing
    .route("/raffle/entries", get(raffle::entries::<S>))
    .route("/raffle/roll", post(raffle::roll::<S>))
    .route("/raffle/results", get(raffle::results::<S>))
    // Ledger
    .route("/users/{id}", get(users::get_one::<S>).put(users::upsert::<S>))
    .route("/users/{id}/points", post(users::award::<S>))
    .with_state(raffle)
}
