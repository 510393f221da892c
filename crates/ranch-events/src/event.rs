//! The event catalog.
//!
//! Every state change in the simulation is surfaced as one [`SimEvent`].
//! Subscribers register against an [`EventKind`], the payload-free tag of
//! each variant.

use ranch_types::{
    AnimalId, BuildingId, BuildingKind, DecorationId, DecorationKind, FeedType, GoodsType,
    InventoryKey, LifeStage, Quality, Season, Species,
};
use serde::Serialize;

/// Payload-free discriminant of [`SimEvent`], used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// See [`SimEvent::TimeAdvanced`].
    TimeAdvanced,
    /// See [`SimEvent::HourChanged`].
    HourChanged,
    /// See [`SimEvent::DayChanged`].
    DayChanged,
    /// See [`SimEvent::SeasonChanged`].
    SeasonChanged,
    /// See [`SimEvent::AnimalMatured`].
    AnimalMatured,
    /// See [`SimEvent::AnimalProduced`].
    AnimalProduced,
    /// See [`SimEvent::AnimalHealthChanged`].
    AnimalHealthChanged,
    /// See [`SimEvent::FeedShortage`].
    FeedShortage,
    /// See [`SimEvent::AnimalPurchased`].
    AnimalPurchased,
    /// See [`SimEvent::AnimalSold`].
    AnimalSold,
    /// See [`SimEvent::GoodsSold`].
    GoodsSold,
    /// See [`SimEvent::BuildingPurchased`].
    BuildingPurchased,
    /// See [`SimEvent::BuildingUpgraded`].
    BuildingUpgraded,
    /// See [`SimEvent::DecorationPurchased`].
    DecorationPurchased,
    /// See [`SimEvent::FeedPurchased`].
    FeedPurchased,
    /// See [`SimEvent::MoneyChanged`].
    MoneyChanged,
}

/// Something that happened on the farm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimEvent {
    /// The activity counter moved forward. Fired once per advance, first.
    TimeAdvanced {
        /// Simulated minutes covered by this advance.
        elapsed_minutes: u64,
        /// Counter value after the advance.
        total_activity_units: u64,
    },

    /// One or more hour boundaries were crossed.
    HourChanged {
        /// Hour of day after the advance.
        hour: u64,
        /// How many hour boundaries this advance crossed.
        crossed: u64,
    },

    /// One or more day boundaries were crossed.
    DayChanged {
        /// Day within the season after the advance.
        day: u64,
        /// Season after the advance.
        season: Season,
        /// How many day boundaries this advance crossed.
        crossed: u64,
    },

    /// One or more season boundaries were crossed.
    SeasonChanged {
        /// Season after the advance.
        season: Season,
        /// Year after the advance.
        year: u64,
        /// How many season boundaries this advance crossed.
        crossed: u64,
    },

    /// An animal entered a new life stage.
    AnimalMatured {
        /// The animal.
        animal_id: AnimalId,
        /// Its species.
        species: Species,
        /// The stage it entered.
        new_stage: LifeStage,
    },

    /// An animal finished one or more production cycles.
    AnimalProduced {
        /// The animal.
        animal_id: AnimalId,
        /// What was produced.
        goods: GoodsType,
        /// Quality of the batch.
        quality: Quality,
        /// Units added to inventory.
        quantity: u64,
    },

    /// An animal's health moved after its daily ration.
    AnimalHealthChanged {
        /// The animal.
        animal_id: AnimalId,
        /// Health before.
        old: f64,
        /// Health after.
        new: f64,
    },

    /// Not enough feed was on hand for an animal's ration.
    FeedShortage {
        /// The hungry animal.
        animal_id: AnimalId,
        /// Feed it needed.
        feed: FeedType,
        /// Units it needed.
        needed: u64,
        /// Units it got.
        eaten: u64,
    },

    /// An animal was bought and housed.
    AnimalPurchased {
        /// The new animal.
        animal_id: AnimalId,
        /// Its species.
        species: Species,
        /// Where it lives.
        building_id: BuildingId,
        /// Price paid.
        price: u64,
    },

    /// An animal was sold and removed.
    AnimalSold {
        /// The animal that left.
        animal_id: AnimalId,
        /// Its species.
        species: Species,
        /// Price received.
        price: u64,
    },

    /// Goods were sold from inventory.
    GoodsSold {
        /// What was sold.
        key: InventoryKey,
        /// Units sold.
        quantity: u64,
        /// Money received.
        revenue: u64,
    },

    /// A building was bought and placed.
    BuildingPurchased {
        /// The new building.
        building_id: BuildingId,
        /// Its kind.
        kind: BuildingKind,
        /// Price paid.
        price: u64,
    },

    /// A building was upgraded.
    BuildingUpgraded {
        /// The building.
        building_id: BuildingId,
        /// Level after the upgrade.
        level: u8,
        /// Price paid.
        price: u64,
    },

    /// A decoration was bought and placed.
    DecorationPurchased {
        /// The new decoration.
        decoration_id: DecorationId,
        /// What it is.
        kind: DecorationKind,
        /// Price paid.
        price: u64,
    },

    /// Feed was bought into inventory.
    FeedPurchased {
        /// Which feed.
        feed: FeedType,
        /// Units bought.
        units: u64,
        /// Price paid.
        price: u64,
    },

    /// The farm balance changed.
    MoneyChanged {
        /// Balance before.
        old: u64,
        /// Balance after.
        new: u64,
    },
}

impl SimEvent {
    /// The subscription tag for this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TimeAdvanced { .. } => EventKind::TimeAdvanced,
            Self::HourChanged { .. } => EventKind::HourChanged,
            Self::DayChanged { .. } => EventKind::DayChanged,
            Self::SeasonChanged { .. } => EventKind::SeasonChanged,
            Self::AnimalMatured { .. } => EventKind::AnimalMatured,
            Self::AnimalProduced { .. } => EventKind::AnimalProduced,
            Self::AnimalHealthChanged { .. } => EventKind::AnimalHealthChanged,
            Self::FeedShortage { .. } => EventKind::FeedShortage,
            Self::AnimalPurchased { .. } => EventKind::AnimalPurchased,
            Self::AnimalSold { .. } => EventKind::AnimalSold,
            Self::GoodsSold { .. } => EventKind::GoodsSold,
            Self::BuildingPurchased { .. } => EventKind::BuildingPurchased,
            Self::BuildingUpgraded { .. } => EventKind::BuildingUpgraded,
            Self::DecorationPurchased { .. } => EventKind::DecorationPurchased,
            Self::FeedPurchased { .. } => EventKind::FeedPurchased,
            Self::MoneyChanged { .. } => EventKind::MoneyChanged,
        }
    }
}
