//! Core types and algorithms for the Hour of Code raffle.
//!
//! No HTTP or database dependencies. This crate owns
//! the prize catalog, the entry pool builder, the draw engine, the storage
//! traits, and the [`Raffle`](service::Raffle) service that ties them together.

pub mod draw;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod prize;
pub mod raffle;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::Raffle;
