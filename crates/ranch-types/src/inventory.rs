//! Farm inventory keyed by goods type and quality.
//!
//! [`InventoryKey`] is the only place the `"{goods}_{quality}"` string is
//! built ([`core::fmt::Display`]) or split ([`core::str::FromStr`]). The
//! split happens on the *last* underscore so multi-word goods such as
//! `chicken_feed_basic` parse correctly.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{GoodsType, ParseEnumError, Quality};

/// Errors from parsing an inventory key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryKeyError {
    /// The key has no `_` separating goods from quality.
    #[error("inventory key {key:?} has no quality suffix")]
    MissingQuality {
        /// The rejected key.
        key: String,
    },

    /// One half of the key did not name a known goods type or quality.
    #[error("inventory key {key:?}: {source}")]
    Unknown {
        /// The rejected key.
        key: String,
        /// Which half failed and why.
        source: ParseEnumError,
    },
}

/// Composite inventory key: a goods type at a quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct InventoryKey {
    /// What the goods are.
    pub goods: GoodsType,
    /// How good they are.
    pub quality: Quality,
}

impl InventoryKey {
    /// Build a key.
    pub const fn new(goods: GoodsType, quality: Quality) -> Self {
        Self { goods, quality }
    }

    /// Key under which a feed type is stored.
    pub fn feed(goods: impl Into<GoodsType>) -> Self {
        Self::new(goods.into(), Quality::Basic)
    }
}

impl fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.goods.as_str(), self.quality.as_str())
    }
}

impl FromStr for InventoryKey {
    type Err = InventoryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (goods, quality) = s
            .rsplit_once('_')
            .ok_or_else(|| InventoryKeyError::MissingQuality { key: s.to_owned() })?;
        let unknown = |source| InventoryKeyError::Unknown {
            key: s.to_owned(),
            source,
        };
        Ok(Self {
            goods: goods.parse().map_err(unknown)?,
            quality: quality.parse().map_err(unknown)?,
        })
    }
}

impl From<InventoryKey> for String {
    fn from(key: InventoryKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for InventoryKey {
    type Error = InventoryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Counts of goods held by the farm.
///
/// Entries that drop to zero are removed, so an empty inventory and one
/// that has been bought and sold back to nothing compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    entries: BTreeMap<InventoryKey, u64>,
}

impl Inventory {
    /// Create an empty inventory.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Units held under `key`.
    pub fn count(&self, key: InventoryKey) -> u64 {
        self.entries.get(&key).copied().unwrap_or(0)
    }

    /// Add `amount` units under `key`, saturating at `u64::MAX`.
    pub fn add(&mut self, key: InventoryKey, amount: u64) {
        if amount == 0 {
            return;
        }
        let slot = self.entries.entry(key).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Remove up to `amount` units under `key` and return how many were
    /// actually removed.
    pub fn take(&mut self, key: InventoryKey, amount: u64) -> u64 {
        let held = self.count(key);
        let taken = held.min(amount);
        let remaining = held.saturating_sub(taken);
        if remaining == 0 {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, remaining);
        }
        taken
    }

    /// Iterate over `(key, count)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (InventoryKey, u64)> + '_ {
        self.entries.iter().map(|(key, count)| (*key, *count))
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total units across all keys.
    pub fn total_units(&self) -> u64 {
        self.entries
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count))
    }
}
