//! Core entity structs: the [`Farm`] aggregate and everything it owns.
//!
//! These are plain data. Growth, pricing, and trading live in
//! `ranch-core` and operate on these structs from the outside.
//!
//! Id-keyed collections are held as `BTreeMap`s in memory and persisted
//! as JSON arrays; the id is read back out of each element on load.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{BuildingKind, DecorationKind, Direction, GoodsType, LifeStage, Species};
use crate::ids::{AnimalId, BuildingId, DecorationId};
use crate::inventory::Inventory;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// A cell on the farm grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPosition {
    /// Build a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Animals
// ---------------------------------------------------------------------------

/// A single animal.
///
/// Created on purchase, mutated only by the growth system, destroyed on
/// sale. `maturity`, `health` and `hunger` always stay within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    /// Unique id.
    pub id: AnimalId,
    /// Species, which fixes housing, feed, and product.
    pub species: Species,
    /// Player-facing name.
    pub name: String,
    /// Simulated age in minutes.
    pub age_minutes: u64,
    /// Progress toward adulthood in `[0, 1]`.
    pub maturity: f64,
    /// Health in `[0, 1]`. Drives product quality.
    pub health: f64,
    /// Fed fraction of the last daily ration in `[0, 1]`.
    pub hunger: f64,
    /// Stage most recently announced; used to fire stage events once.
    pub last_seen_stage: LifeStage,
    /// Production-eligible minutes banked toward the next product.
    pub production_timer_minutes: u64,
    /// Building the animal lives in, if any. Non-owning.
    pub housing: Option<BuildingId>,
}

impl Animal {
    /// A freshly bought, healthy, fully fed baby.
    pub fn newborn(species: Species, name: impl Into<String>, housing: Option<BuildingId>) -> Self {
        Self {
            id: AnimalId::new(),
            species,
            name: name.into(),
            age_minutes: 0,
            maturity: 0.0,
            health: 1.0,
            hunger: 1.0,
            last_seen_stage: LifeStage::Baby,
            production_timer_minutes: 0,
            housing,
        }
    }

    /// Current stage as derived from maturity.
    pub const fn stage(&self) -> LifeStage {
        LifeStage::from_maturity(self.maturity)
    }
}

// ---------------------------------------------------------------------------
// Buildings and decorations
// ---------------------------------------------------------------------------

/// Animal housing placed on the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Unique id.
    pub id: BuildingId,
    /// What kind of building this is.
    pub kind: BuildingKind,
    /// Upgrade level, `1..=BuildingKind::MAX_LEVEL`.
    pub level: u8,
    /// Where it stands.
    pub position: GridPosition,
    /// Animals living here. Never larger than [`Building::capacity`].
    pub housed: BTreeSet<AnimalId>,
}

impl Building {
    /// A new level-1 building.
    pub fn new(kind: BuildingKind, position: GridPosition) -> Self {
        Self {
            id: BuildingId::new(),
            kind,
            level: 1,
            position,
            housed: BTreeSet::new(),
        }
    }

    /// How many animals fit at the current level. Zero for an out-of-range
    /// level, which blocks any further housing.
    pub fn capacity(&self) -> usize {
        self.kind.capacity(self.level).unwrap_or(0)
    }

    /// Whether one more animal fits.
    pub fn has_room(&self) -> bool {
        self.housed.len() < self.capacity()
    }

    /// Whether this building accepts `species` at all.
    pub fn accepts(&self, species: Species) -> bool {
        self.kind.houses() == species
    }
}

/// A placed decoration. No simulation effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    /// Unique id.
    pub id: DecorationId,
    /// What it is.
    pub kind: DecorationKind,
    /// Where it stands.
    pub position: GridPosition,
    /// Which way it faces.
    #[serde(default)]
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Lifetime counters for the farm.
///
/// `total_activity_units` is the only persisted notion of time; every
/// calendar value is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Activity units ever reported. Monotonic.
    pub total_activity_units: u64,
    /// Money earned from all sales.
    pub total_money_earned: u64,
    /// Animals that reached adulthood on this farm.
    pub total_animals_raised: u64,
    /// Animals sold.
    pub total_animals_sold: u64,
    /// Product units sold.
    pub total_products_sold: u64,
    /// Highest balance ever held.
    pub highest_money_held: u64,
    /// Adults raised, per species.
    pub animals_raised_by_species: BTreeMap<Species, u64>,
    /// Animals sold, per species.
    pub animals_sold_by_species: BTreeMap<Species, u64>,
    /// Units sold, per goods type.
    pub products_sold_by_goods: BTreeMap<GoodsType, u64>,
}

impl Statistics {
    /// Record an animal reaching adulthood.
    pub fn record_raised(&mut self, species: Species) {
        self.total_animals_raised = self.total_animals_raised.saturating_add(1);
        bump(&mut self.animals_raised_by_species, species, 1);
    }

    /// Record an animal sale that earned `price`.
    pub fn record_animal_sold(&mut self, species: Species, price: u64) {
        self.total_animals_sold = self.total_animals_sold.saturating_add(1);
        bump(&mut self.animals_sold_by_species, species, 1);
        self.total_money_earned = self.total_money_earned.saturating_add(price);
    }

    /// Record `quantity` units of `goods` sold for `revenue` in total.
    pub fn record_goods_sold(&mut self, goods: GoodsType, quantity: u64, revenue: u64) {
        self.total_products_sold = self.total_products_sold.saturating_add(quantity);
        bump(&mut self.products_sold_by_goods, goods, quantity);
        self.total_money_earned = self.total_money_earned.saturating_add(revenue);
    }

    /// Track the high-water mark of the balance.
    pub fn observe_balance(&mut self, money: u64) {
        self.highest_money_held = self.highest_money_held.max(money);
    }
}

fn bump<K: Ord>(map: &mut BTreeMap<K, u64>, key: K, by: u64) {
    let slot = map.entry(key).or_insert(0);
    *slot = slot.saturating_add(by);
}

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

/// The aggregate root. Owns every building, animal, decoration, and good,
/// and is the sole unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    /// Spendable balance.
    pub money: u64,
    /// Placed buildings.
    #[serde(with = "keyed_seq")]
    pub buildings: BTreeMap<BuildingId, Building>,
    /// Living animals.
    #[serde(with = "keyed_seq")]
    pub animals: BTreeMap<AnimalId, Animal>,
    /// Placed decorations.
    #[serde(with = "keyed_seq")]
    pub decorations: BTreeMap<DecorationId, Decoration>,
    /// Goods on hand.
    #[serde(default)]
    pub inventory: Inventory,
    /// Lifetime counters, including the activity counter.
    #[serde(default)]
    pub statistics: Statistics,
}

impl Farm {
    /// An empty farm holding `money`.
    pub fn new(money: u64) -> Self {
        let mut statistics = Statistics::default();
        statistics.observe_balance(money);
        Self {
            money,
            statistics,
            ..Self::default()
        }
    }

    /// Number of animals of `species`.
    pub fn count_species(&self, species: Species) -> usize {
        self.animals
            .values()
            .filter(|animal| animal.species == species)
            .count()
    }
}

/// Values that carry their own map key.
trait Keyed {
    type Key: Ord;
    fn key(&self) -> Self::Key;
}

impl Keyed for Building {
    type Key = BuildingId;
    fn key(&self) -> BuildingId {
        self.id
    }
}

impl Keyed for Animal {
    type Key = AnimalId;
    fn key(&self) -> AnimalId {
        self.id
    }
}

impl Keyed for Decoration {
    type Key = DecorationId;
    fn key(&self) -> DecorationId {
        self.id
    }
}

/// Serde adapter: an id-keyed map on the Rust side, a plain array on disk.
mod keyed_seq {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Keyed;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<V::Key, V>, D::Error>
    where
        V: Deserialize<'de> + Keyed,
        D: Deserializer<'de>,
    {
        let items = Vec::<V>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|item| (item.key(), item)).collect())
    }
}
