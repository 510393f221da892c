//! Enumeration types for the ranch simulation.
//!
//! All enums serialize as `snake_case` strings so the persisted save file
//! stays readable (`"chicken"`, `"egg"`, `"premium"`).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string did not name a known variant of one of the enums in this module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. `"goods type"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Species and life stages
// ---------------------------------------------------------------------------

/// An animal species that can be raised on the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Lays eggs, lives in a coop.
    Chicken,
    /// Digs truffles, lives in a pigsty.
    Pig,
    /// Gives milk, lives in a barn.
    Cow,
}

impl Species {
    /// Every species, in shop order.
    pub const ALL: [Self; 3] = [Self::Chicken, Self::Pig, Self::Cow];

    /// The building kind that can house this species.
    pub const fn housing(self) -> BuildingKind {
        match self {
            Self::Chicken => BuildingKind::Coop,
            Self::Pig => BuildingKind::Pigsty,
            Self::Cow => BuildingKind::Barn,
        }
    }

    /// Lowercase name as it appears in save files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chicken => "chicken",
            Self::Pig => "pig",
            Self::Cow => "cow",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|species| species.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "species",
                value: s.to_owned(),
            })
    }
}

/// Discrete growth stage derived from maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    /// Maturity below [`LifeStage::TEEN_THRESHOLD`].
    Baby,
    /// Maturity in `[0.33, 0.66)`.
    Teen,
    /// Maturity at or above [`LifeStage::ADULT_THRESHOLD`].
    Adult,
}

impl LifeStage {
    /// Lowest maturity that counts as [`LifeStage::Teen`].
    pub const TEEN_THRESHOLD: f64 = 0.33;

    /// Lowest maturity that counts as [`LifeStage::Adult`].
    pub const ADULT_THRESHOLD: f64 = 0.66;

    /// Map a maturity value onto a stage. Thresholds belong to the upper
    /// stage, so exactly `0.33` is already a teen.
    pub const fn from_maturity(maturity: f64) -> Self {
        if maturity >= Self::ADULT_THRESHOLD {
            Self::Adult
        } else if maturity >= Self::TEEN_THRESHOLD {
            Self::Teen
        } else {
            Self::Baby
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// A season of the farm year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// First season of every year.
    Spring,
    /// Second season.
    Summer,
    /// Third season.
    Fall,
    /// Last season before the year rolls over.
    Winter,
}

impl Season {
    /// Seasons in calendar order.
    pub const ORDER: [Self; 4] = [Self::Spring, Self::Summer, Self::Fall, Self::Winter];

    /// Display name, capitalised.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
            Self::Winter => "Winter",
        }
    }

    /// Season at `index` within the year, wrapping past the last one.
    pub fn from_index(index: u64) -> Self {
        match index.checked_rem(4).unwrap_or(0) {
            0 => Self::Spring,
            1 => Self::Summer,
            2 => Self::Fall,
            _ => Self::Winter,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse phase of the day, derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// 05:00 to 11:59.
    Morning,
    /// 12:00 to 16:59.
    Afternoon,
    /// 17:00 to 20:59.
    Evening,
    /// Everything else.
    Night,
}

impl TimeOfDay {
    /// Phase for a given hour of the day.
    pub const fn from_hour(hour: u64) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }
}

// ---------------------------------------------------------------------------
// Goods
// ---------------------------------------------------------------------------

/// Anything that can sit in the farm inventory.
///
/// Products come out of animals; feed goes into them. Feed is always
/// stored at [`Quality::Basic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsType {
    /// Produced by chickens.
    Egg,
    /// Produced by pigs.
    Truffle,
    /// Produced by cows.
    Milk,
    /// Eaten by chickens.
    ChickenFeed,
    /// Eaten by pigs.
    PigFeed,
    /// Eaten by cows.
    CowFeed,
}

impl GoodsType {
    /// Every goods type.
    pub const ALL: [Self; 6] = [
        Self::Egg,
        Self::Truffle,
        Self::Milk,
        Self::ChickenFeed,
        Self::PigFeed,
        Self::CowFeed,
    ];

    /// Name used in inventory keys and save files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Egg => "egg",
            Self::Truffle => "truffle",
            Self::Milk => "milk",
            Self::ChickenFeed => "chicken_feed",
            Self::PigFeed => "pig_feed",
            Self::CowFeed => "cow_feed",
        }
    }

    /// Whether this is animal feed rather than a sellable product.
    pub const fn is_feed(self) -> bool {
        matches!(self, Self::ChickenFeed | Self::PigFeed | Self::CowFeed)
    }
}

impl fmt::Display for GoodsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoodsType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|goods| goods.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "goods type",
                value: s.to_owned(),
            })
    }
}

/// The feed a species eats. Converts into the matching [`GoodsType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    /// Chicken feed.
    ChickenFeed,
    /// Pig feed.
    PigFeed,
    /// Cow feed.
    CowFeed,
}

impl FeedType {
    /// The feed eaten by `species`.
    pub const fn for_species(species: Species) -> Self {
        match species {
            Species::Chicken => Self::ChickenFeed,
            Species::Pig => Self::PigFeed,
            Species::Cow => Self::CowFeed,
        }
    }

    /// The inventory goods type this feed is stored as.
    pub const fn goods(self) -> GoodsType {
        match self {
            Self::ChickenFeed => GoodsType::ChickenFeed,
            Self::PigFeed => GoodsType::PigFeed,
            Self::CowFeed => GoodsType::CowFeed,
        }
    }
}

impl From<FeedType> for GoodsType {
    fn from(feed: FeedType) -> Self {
        feed.goods()
    }
}

/// Ordered quality tier of a produced good.
///
/// Assigned once at production time from the producing animal's health and
/// never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Lowest tier.
    Basic,
    /// Health at least 0.60.
    Good,
    /// Health at least 0.80.
    Premium,
    /// Health at least 0.95.
    Artisan,
}

impl Quality {
    /// Every tier, lowest first.
    pub const ALL: [Self; 4] = [Self::Basic, Self::Good, Self::Premium, Self::Artisan];

    /// Name used in inventory keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Good => "good",
            Self::Premium => "premium",
            Self::Artisan => "artisan",
        }
    }

    /// Tier earned by an animal with the given health.
    pub const fn from_health(health: f64) -> Self {
        if health >= 0.95 {
            Self::Artisan
        } else if health >= 0.80 {
            Self::Premium
        } else if health >= 0.60 {
            Self::Good
        } else {
            Self::Basic
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|quality| quality.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "quality",
                value: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Buildings and decorations
// ---------------------------------------------------------------------------

/// A kind of animal housing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Houses chickens.
    Coop,
    /// Houses pigs.
    Pigsty,
    /// Houses cows.
    Barn,
}

impl BuildingKind {
    /// Highest level any building can be upgraded to.
    pub const MAX_LEVEL: u8 = 4;

    /// The only species this building accepts.
    pub const fn houses(self) -> Species {
        match self {
            Self::Coop => Species::Chicken,
            Self::Pigsty => Species::Pig,
            Self::Barn => Species::Cow,
        }
    }

    /// Number of animals a building of this kind holds at `level`.
    ///
    /// Returns `None` for levels outside `1..=MAX_LEVEL`.
    pub const fn capacity(self, level: u8) -> Option<usize> {
        let capacity = match (self, level) {
            (Self::Coop, 1) => 4,
            (Self::Coop, 2) => 7,
            (Self::Coop, 3) => 11,
            (Self::Coop, 4) => 16,
            (Self::Pigsty, 1) => 3,
            (Self::Pigsty, 2) => 5,
            (Self::Pigsty, 3) => 8,
            (Self::Pigsty, 4) => 12,
            (Self::Barn, 1) => 2,
            (Self::Barn, 2) => 4,
            (Self::Barn, 3) => 6,
            (Self::Barn, 4) => 9,
            _ => return None,
        };
        Some(capacity)
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Coop => "coop",
            Self::Pigsty => "pigsty",
            Self::Barn => "barn",
        })
    }
}

/// A purely decorative placeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    /// Stack of hay.
    HayBale,
    /// Bed of flowers.
    FlowerBed,
    /// A single tree.
    Tree,
    /// Keeps the crows honest.
    Scarecrow,
    /// Small pumpkin patch.
    PumpkinPatch,
    /// Large windmill.
    Windmill,
    /// Stone well.
    WaterWell,
    /// Silo that stores nothing.
    DecorativeSilo,
    /// Parked cart.
    WoodenCart,
    /// Small pond.
    Pond,
    /// Stone fountain.
    Fountain,
    /// Trough by the fence.
    WaterTrough,
    /// Park bench.
    Bench,
    /// Picnic table.
    PicnicTable,
    /// Lamp post.
    LampPost,
    /// Garden gnome.
    GardenGnome,
    /// Mailbox.
    Mailbox,
    /// Signpost.
    Signpost,
}

/// Which way a placed decoration faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Default facing.
    #[default]
    East,
    /// Mirrored.
    West,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stage_thresholds_belong_to_upper_stage() {
        assert_eq!(LifeStage::from_maturity(0.0), LifeStage::Baby);
        assert_eq!(LifeStage::from_maturity(0.329), LifeStage::Baby);
        assert_eq!(LifeStage::from_maturity(0.33), LifeStage::Teen);
        assert_eq!(LifeStage::from_maturity(0.659), LifeStage::Teen);
        assert_eq!(LifeStage::from_maturity(0.66), LifeStage::Adult);
        assert_eq!(LifeStage::from_maturity(1.0), LifeStage::Adult);
    }

    #[test]
    fn quality_bands() {
        assert_eq!(Quality::from_health(1.0), Quality::Artisan);
        assert_eq!(Quality::from_health(0.95), Quality::Artisan);
        assert_eq!(Quality::from_health(0.9), Quality::Premium);
        assert_eq!(Quality::from_health(0.6), Quality::Good);
        assert_eq!(Quality::from_health(0.59), Quality::Basic);
        assert!(Quality::Basic < Quality::Artisan);
    }

    #[test]
    fn goods_names_round_trip() {
        for goods in GoodsType::ALL {
            assert_eq!(goods.as_str().parse::<GoodsType>().unwrap(), goods);
        }
        assert!("caviar".parse::<GoodsType>().is_err());
    }

    #[test]
    fn season_wraps_by_index() {
        assert_eq!(Season::from_index(0), Season::Spring);
        assert_eq!(Season::from_index(3), Season::Winter);
        assert_eq!(Season::from_index(4), Season::Spring);
    }

    #[test]
    fn capacity_table_covers_every_level() {
        assert_eq!(BuildingKind::Coop.capacity(1), Some(4));
        assert_eq!(BuildingKind::Barn.capacity(BuildingKind::MAX_LEVEL), Some(9));
        assert_eq!(BuildingKind::Pigsty.capacity(0), None);
        assert_eq!(BuildingKind::Pigsty.capacity(5), None);
    }

    #[test]
    fn housing_pairs_are_symmetric() {
        for species in Species::ALL {
            assert_eq!(species.housing().houses(), species);
        }
    }

    #[test]
    fn time_of_day_bands() {
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
    }
}
