//! Configuration loading and typed config structures for the ranch simulation.
//!
//! The canonical configuration lives in `ranch-config.yaml` at the project
//! root. Every section is optional; anything left out falls back to the
//! defaults below, which reproduce the shipped game balance.

use std::path::{Path, PathBuf};

use ranch_types::{BuildingKind, FeedType, GoodsType, Quality, Species};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The file parsed but holds values the simulation cannot run with.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `ranch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Calendar arithmetic.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Health and production rules.
    #[serde(default)]
    pub growth: GrowthConfig,

    /// Per-species tables.
    #[serde(default)]
    pub species: SpeciesTable,

    /// Prices and starting balance.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Save file location and autosave cadence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Optional push of saves to a remote endpoint.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `RANCH_SAVE_DIR` overrides `persistence.save_dir`
    /// - `RANCH_SYNC_URL` overrides `sync.endpoint`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RANCH_SAVE_DIR") {
            self.persistence.save_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("RANCH_SYNC_URL") {
            self.sync.endpoint = val;
        }
    }

    /// Reject values that would make the simulation divide by zero or
    /// leave the `[0, 1]` health range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = &self.calendar;
        for (name, value) in [
            ("calendar.minutes_per_hour", cal.minutes_per_hour),
            ("calendar.hours_per_day", cal.hours_per_day),
            ("calendar.days_per_season", cal.days_per_season),
            ("calendar.minutes_per_unit", cal.minutes_per_unit),
        ] {
            if value == 0 {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }

        for species in Species::ALL {
            let entry = self.species.get(species);
            if entry.maturity_minutes == 0 {
                return Err(invalid(format!(
                    "species.{species}.maturity_minutes must be at least 1"
                )));
            }
            if entry.production_interval_minutes == 0 {
                return Err(invalid(format!(
                    "species.{species}.production_interval_minutes must be at least 1"
                )));
            }
        }

        let floor = self.growth.production_health_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(invalid(format!(
                "growth.production_health_floor must be within [0, 1], got {floor}"
            )));
        }
        for (name, rate) in [
            (
                "growth.starvation_health_loss_per_day",
                self.growth.starvation_health_loss_per_day,
            ),
            (
                "growth.fed_health_recovery_per_day",
                self.growth.fed_health_recovery_per_day,
            ),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Fixed constants of the farm calendar. A year always has four seasons.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarConfig {
    /// Minutes in one hour.
    #[serde(default = "default_minutes_per_hour")]
    pub minutes_per_hour: u64,

    /// Hours in one day.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u64,

    /// Days in one season.
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u64,

    /// Simulated minutes per external activity unit.
    #[serde(default = "default_minutes_per_unit")]
    pub minutes_per_unit: u64,

    /// Calendar minute that counter value 0 maps to (360 = 06:00).
    #[serde(default = "default_starting_offset_minutes")]
    pub starting_offset_minutes: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            minutes_per_hour: default_minutes_per_hour(),
            hours_per_day: default_hours_per_day(),
            days_per_season: default_days_per_season(),
            minutes_per_unit: default_minutes_per_unit(),
            starting_offset_minutes: default_starting_offset_minutes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

/// Health and production policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrowthConfig {
    /// Animals at or below this health neither produce nor bank
    /// production time.
    #[serde(default = "default_production_health_floor")]
    pub production_health_floor: f64,

    /// Health lost per day with no feed at all. Scaled by the deficit
    /// fraction for partial rations.
    #[serde(default = "default_starvation_health_loss_per_day")]
    pub starvation_health_loss_per_day: f64,

    /// Health regained per fully fed day.
    #[serde(default = "default_fed_health_recovery_per_day")]
    pub fed_health_recovery_per_day: f64,

    /// Apply the seasonal production and price tables. Off by default,
    /// in which case every season is neutral.
    #[serde(default)]
    pub seasonal_modifiers: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            production_health_floor: default_production_health_floor(),
            starvation_health_loss_per_day: default_starvation_health_loss_per_day(),
            fed_health_recovery_per_day: default_fed_health_recovery_per_day(),
            seasonal_modifiers: false,
        }
    }
}

/// Everything the simulation needs to know about one species.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesConfig {
    /// Age in minutes at which maturity reaches 1.0.
    pub maturity_minutes: u64,
    /// Production-eligible minutes per product.
    pub production_interval_minutes: u64,
    /// What an adult produces.
    pub product: GoodsType,
    /// Feed units eaten per day.
    pub feed_per_day: u64,
    /// Shop price.
    pub purchase_price: u64,
    /// Sale price of a fully grown, fully healthy animal.
    pub base_sale_price: u64,
}

/// Per-species tables. Overriding a species replaces its whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesTable {
    /// Chickens.
    #[serde(default = "default_chicken")]
    pub chicken: SpeciesConfig,
    /// Pigs.
    #[serde(default = "default_pig")]
    pub pig: SpeciesConfig,
    /// Cows.
    #[serde(default = "default_cow")]
    pub cow: SpeciesConfig,
}

impl SpeciesTable {
    /// Entry for `species`.
    pub const fn get(&self, species: Species) -> &SpeciesConfig {
        match species {
            Species::Chicken => &self.chicken,
            Species::Pig => &self.pig,
            Species::Cow => &self.cow,
        }
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            chicken: default_chicken(),
            pig: default_pig(),
            cow: default_cow(),
        }
    }
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// Prices, costs, and the starting balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Balance of a brand-new farm.
    #[serde(default = "default_initial_money")]
    pub initial_money: u64,

    /// Product price table.
    #[serde(default)]
    pub prices: PriceTable,

    /// Building purchase and upgrade costs.
    #[serde(default)]
    pub buildings: BuildingCosts,

    /// Feed prices per 100 units.
    #[serde(default)]
    pub feed: FeedPrices,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_money: default_initial_money(),
            prices: PriceTable::default(),
            buildings: BuildingCosts::default(),
            feed: FeedPrices::default(),
        }
    }
}

/// Static inputs to unit pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PriceTable {
    /// Base price per goods type.
    #[serde(default)]
    pub base: BasePrices,
    /// Multiplier per quality tier.
    #[serde(default)]
    pub quality: QualityMultipliers,
}

/// Base price of one unit of each product. Feed has no resale value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasePrices {
    /// Eggs.
    #[serde(default = "default_egg_price")]
    pub egg: u64,
    /// Truffles.
    #[serde(default = "default_truffle_price")]
    pub truffle: u64,
    /// Milk.
    #[serde(default = "default_milk_price")]
    pub milk: u64,
}

impl BasePrices {
    /// Base price of `goods`.
    pub const fn get(&self, goods: GoodsType) -> u64 {
        match goods {
            GoodsType::Egg => self.egg,
            GoodsType::Truffle => self.truffle,
            GoodsType::Milk => self.milk,
            GoodsType::ChickenFeed | GoodsType::PigFeed | GoodsType::CowFeed => 0,
        }
    }
}

impl Default for BasePrices {
    fn default() -> Self {
        Self {
            egg: default_egg_price(),
            truffle: default_truffle_price(),
            milk: default_milk_price(),
        }
    }
}

/// Price multiplier for each quality tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QualityMultipliers {
    /// Basic tier.
    #[serde(default = "default_basic_multiplier")]
    pub basic: Decimal,
    /// Good tier.
    #[serde(default = "default_good_multiplier")]
    pub good: Decimal,
    /// Premium tier.
    #[serde(default = "default_premium_multiplier")]
    pub premium: Decimal,
    /// Artisan tier.
    #[serde(default = "default_artisan_multiplier")]
    pub artisan: Decimal,
}

impl QualityMultipliers {
    /// Multiplier for `quality`.
    pub const fn get(&self, quality: Quality) -> Decimal {
        match quality {
            Quality::Basic => self.basic,
            Quality::Good => self.good,
            Quality::Premium => self.premium,
            Quality::Artisan => self.artisan,
        }
    }
}

impl Default for QualityMultipliers {
    fn default() -> Self {
        Self {
            basic: default_basic_multiplier(),
            good: default_good_multiplier(),
            premium: default_premium_multiplier(),
            artisan: default_artisan_multiplier(),
        }
    }
}

/// Building costs. Upgrading to level `n + 1` costs `upgrade_base * n`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingCosts {
    /// Coop purchase price.
    #[serde(default = "default_coop_cost")]
    pub coop: u64,
    /// Pigsty purchase price.
    #[serde(default = "default_pigsty_cost")]
    pub pigsty: u64,
    /// Barn purchase price.
    #[serde(default = "default_barn_cost")]
    pub barn: u64,
    /// Coop upgrade base.
    #[serde(default = "default_coop_upgrade")]
    pub coop_upgrade_base: u64,
    /// Pigsty upgrade base.
    #[serde(default = "default_pigsty_upgrade")]
    pub pigsty_upgrade_base: u64,
    /// Barn upgrade base.
    #[serde(default = "default_barn_upgrade")]
    pub barn_upgrade_base: u64,
}

impl BuildingCosts {
    /// Purchase price of a new building.
    pub const fn purchase(&self, kind: BuildingKind) -> u64 {
        match kind {
            BuildingKind::Coop => self.coop,
            BuildingKind::Pigsty => self.pigsty,
            BuildingKind::Barn => self.barn,
        }
    }

    /// Cost to upgrade a building currently at `level`.
    pub const fn upgrade(&self, kind: BuildingKind, level: u8) -> u64 {
        let base = match kind {
            BuildingKind::Coop => self.coop_upgrade_base,
            BuildingKind::Pigsty => self.pigsty_upgrade_base,
            BuildingKind::Barn => self.barn_upgrade_base,
        };
        base.saturating_mul(level as u64)
    }
}

impl Default for BuildingCosts {
    fn default() -> Self {
        Self {
            coop: default_coop_cost(),
            pigsty: default_pigsty_cost(),
            barn: default_barn_cost(),
            coop_upgrade_base: default_coop_upgrade(),
            pigsty_upgrade_base: default_pigsty_upgrade(),
            barn_upgrade_base: default_barn_upgrade(),
        }
    }
}

/// Feed prices, per 100 units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedPrices {
    /// Chicken feed.
    #[serde(default = "default_chicken_feed_price")]
    pub chicken_feed: u64,
    /// Pig feed.
    #[serde(default = "default_pig_feed_price")]
    pub pig_feed: u64,
    /// Cow feed.
    #[serde(default = "default_cow_feed_price")]
    pub cow_feed: u64,
}

impl FeedPrices {
    /// Price per 100 units of `feed`.
    pub const fn per_hundred(&self, feed: FeedType) -> u64 {
        match feed {
            FeedType::ChickenFeed => self.chicken_feed,
            FeedType::PigFeed => self.pig_feed,
            FeedType::CowFeed => self.cow_feed,
        }
    }
}

impl Default for FeedPrices {
    fn default() -> Self {
        Self {
            chicken_feed: default_chicken_feed_price(),
            pig_feed: default_pig_feed_price(),
            cow_feed: default_cow_feed_price(),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence, sync, logging
// ---------------------------------------------------------------------------

/// Where saves go and how often the engine writes them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the save file and its backup.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Save after this many activity units (0 disables the cadence).
    #[serde(default = "default_autosave_every_units")]
    pub autosave_every_units: u64,

    /// Also save whenever a day boundary is crossed.
    #[serde(default = "default_true")]
    pub autosave_on_day_change: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            autosave_every_units: default_autosave_every_units(),
            autosave_on_day_change: true,
        }
    }
}

/// Fire-and-forget push of each committed save.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Whether to push at all.
    #[serde(default)]
    pub enabled: bool,

    /// URL receiving a `POST` of the save document.
    #[serde(default = "default_sync_endpoint")]
    pub endpoint: String,

    /// Request timeout.
    #[serde(default = "default_sync_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_sync_endpoint(),
            timeout_ms: default_sync_timeout_ms(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_minutes_per_hour() -> u64 {
    60
}

const fn default_hours_per_day() -> u64 {
    24
}

const fn default_days_per_season() -> u64 {
    7
}

const fn default_minutes_per_unit() -> u64 {
    1
}

const fn default_starting_offset_minutes() -> u64 {
    6 * 60
}

const fn default_production_health_floor() -> f64 {
    0.3
}

const fn default_starvation_health_loss_per_day() -> f64 {
    0.24
}

const fn default_fed_health_recovery_per_day() -> f64 {
    0.12
}

const fn default_chicken() -> SpeciesConfig {
    SpeciesConfig {
        maturity_minutes: 1500,
        production_interval_minutes: 240,
        product: GoodsType::Egg,
        feed_per_day: 1,
        purchase_price: 80,
        base_sale_price: 120,
    }
}

const fn default_pig() -> SpeciesConfig {
    SpeciesConfig {
        maturity_minutes: 2220,
        production_interval_minutes: 480,
        product: GoodsType::Truffle,
        feed_per_day: 2,
        purchase_price: 200,
        base_sale_price: 350,
    }
}

const fn default_cow() -> SpeciesConfig {
    SpeciesConfig {
        maturity_minutes: 3160,
        production_interval_minutes: 360,
        product: GoodsType::Milk,
        feed_per_day: 3,
        purchase_price: 400,
        base_sale_price: 700,
    }
}

const fn default_initial_money() -> u64 {
    1500
}

const fn default_egg_price() -> u64 {
    10
}

const fn default_truffle_price() -> u64 {
    40
}

const fn default_milk_price() -> u64 {
    35
}

const fn default_basic_multiplier() -> Decimal {
    Decimal::ONE
}

const fn default_good_multiplier() -> Decimal {
    Decimal::from_parts(13, 0, 0, false, 1)
}

const fn default_premium_multiplier() -> Decimal {
    Decimal::from_parts(16, 0, 0, false, 1)
}

const fn default_artisan_multiplier() -> Decimal {
    Decimal::TWO
}

const fn default_coop_cost() -> u64 {
    500
}

const fn default_pigsty_cost() -> u64 {
    1000
}

const fn default_barn_cost() -> u64 {
    2000
}

const fn default_coop_upgrade() -> u64 {
    400
}

const fn default_pigsty_upgrade() -> u64 {
    800
}

const fn default_barn_upgrade() -> u64 {
    1500
}

const fn default_chicken_feed_price() -> u64 {
    50
}

const fn default_pig_feed_price() -> u64 {
    75
}

const fn default_cow_feed_price() -> u64 {
    100
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

const fn default_autosave_every_units() -> u64 {
    25
}

const fn default_true() -> bool {
    true
}

fn default_sync_endpoint() -> String {
    "http://localhost:8080/api/farm".to_owned()
}

const fn default_sync_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
