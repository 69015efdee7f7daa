//! The prize catalog.
//!
//! A catalog is an ordered list of prizes. Order matters: the draw engine
//! fills prizes in catalog order, so earlier prizes pick from the largest pool.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Display grouping of a prize. Has no effect on the draw itself.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrizeTier {
  Major,
  /// Records written before tiers existed decode as `Minor`.
  #[default]
  Minor,
}

// ─── Prize ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
  /// Unique within a catalog.
  pub id:          String,
  pub name:        String,
  #[serde(default)]
  pub description: String,
  /// Number of independent winner slots.
  pub quantity:    u32,
  #[serde(default)]
  pub tier:        PrizeTier,
}

impl Prize {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
    quantity: u32,
    tier: PrizeTier,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      description: description.into(),
      quantity,
      tier,
    }
  }
}

/// A prize as submitted by the catalog editor. A missing id is assigned a
/// fresh `custom-<uuid>` identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrize {
  pub id:          Option<String>,
  pub name:        String,
  #[serde(default)]
  pub description: String,
  pub quantity:    u32,
  pub tier:        Option<PrizeTier>,
}

impl From<NewPrize> for Prize {
  fn from(p: NewPrize) -> Self {
    Prize {
      id:          p
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("custom-{}", Uuid::new_v4())),
      name:        p.name,
      description: p.description,
      quantity:    p.quantity,
      tier:        p.tier.unwrap_or_default(),
    }
  }
}

// ─── Catalog helpers ─────────────────────────────────────────────────────────

/// The catalog used when none has been configured.
pub fn default_catalog() -> Vec<Prize> {
  vec![
    Prize::new(
      "ipad",
      "Apple iPad (A16)",
      "1x Apple iPad with A16 chip",
      1,
      PrizeTier::Major,
    ),
    Prize::new(
      "jbl",
      "JBL Tune 720BT",
      "1x JBL Tune 720BT Headphones",
      1,
      PrizeTier::Major,
    ),
    Prize::new(
      "giftcard",
      "$10 Amazon Giftcard",
      "10x $10 Amazon Giftcards",
      10,
      PrizeTier::Minor,
    ),
  ]
}

/// An empty catalog is replaced by [`default_catalog`].
pub fn normalize_catalog(prizes: Vec<Prize>) -> Vec<Prize> {
  if prizes.is_empty() { default_catalog() } else { prizes }
}

/// Check that every prize has at least one slot and that ids are unique.
pub fn validate_catalog(prizes: &[Prize]) -> Result<()> {
  let mut seen = HashSet::with_capacity(prizes.len());
  for prize in prizes {
    if prize.id.trim().is_empty() {
      return Err(Error::InvalidCatalog("prize id must not be empty".into()));
    }
    if prize.quantity == 0 {
      return Err(Error::InvalidCatalog(format!(
        "prize {:?} must have a quantity of at least 1",
        prize.id
      )));
    }
    if !seen.insert(prize.id.as_str()) {
      return Err(Error::InvalidCatalog(format!(
        "duplicate prize id {:?}",
        prize.id
      )));
    }
  }
  Ok(())
}

/// Total number of winner slots across the catalog.
pub fn total_slots(prizes: &[Prize]) -> u64 {
  prizes.iter().map(|p| u64::from(p.quantity)).sum()
}
