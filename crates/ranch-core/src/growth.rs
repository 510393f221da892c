//! Per-animal aging, feeding, and production.
//!
//! [`GrowthSystem`] holds only tables. Each update mutates every animal on
//! the farm, collects the resulting events, and publishes them once the
//! whole herd has been processed, so subscribers never observe a
//! half-updated farm.
//!
//! # Order of operations
//!
//! 1. Age every animal by the elapsed minutes
//! 2. Recompute maturity and announce a stage change once
//! 3. Feed: each animal owes one ration per day boundary crossed in its own
//!    age. Animals sharing a feed type split a short stock in proportion
//! 4. Bank production time and emit finished products

use std::collections::BTreeMap;

use ranch_events::{EventBus, SimEvent};
use ranch_types::{
    Animal, AnimalId, Farm, FeedType, Inventory, InventoryKey, LifeStage, Quality, Season,
    Statistics,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::config::{GrowthConfig, SimulationConfig, SpeciesConfig, SpeciesTable};
use crate::modifiers::{self, SeasonalModifier};

/// Health changes smaller than this are not reported.
const HEALTH_EPSILON: f64 = 1e-9;

/// Minutes in an hour, for [`Elapsed::hours`].
const MINUTES_PER_HOUR: u64 = 60;

/// Simulated time handed to [`GrowthSystem::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    minutes: u64,
    season: Season,
}

impl Elapsed {
    /// `minutes` of simulated time, in spring unless overridden.
    pub const fn minutes(minutes: u64) -> Self {
        Self {
            minutes,
            season: Season::Spring,
        }
    }

    /// `hours` of simulated time. Saturates instead of overflowing.
    pub const fn hours(hours: u64) -> Self {
        Self::minutes(hours.saturating_mul(MINUTES_PER_HOUR))
    }

    /// The same span, spent in `season`.
    pub const fn in_season(self, season: Season) -> Self {
        Self {
            minutes: self.minutes,
            season,
        }
    }

    /// Length in minutes.
    pub const fn as_minutes(self) -> u64 {
        self.minutes
    }

    /// Season in effect.
    pub const fn season(self) -> Season {
        self.season
    }
}

/// Feed one animal owes for the days it crossed this step.
#[derive(Debug, Clone, Copy)]
struct Ration {
    animal: AnimalId,
    days: u64,
    needed: u64,
}

/// Applies elapsed time to every animal on a farm.
pub struct GrowthSystem {
    growth: GrowthConfig,
    species: SpeciesTable,
    minutes_per_day: u64,
    modifier: Box<dyn SeasonalModifier>,
}

impl std::fmt::Debug for GrowthSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowthSystem")
            .field("growth", &self.growth)
            .field("species", &self.species)
            .field("minutes_per_day", &self.minutes_per_day)
            .finish_non_exhaustive()
    }
}

impl GrowthSystem {
    /// Build from configuration. The seasonal modifier follows
    /// `growth.seasonal_modifiers`.
    pub fn new(config: &SimulationConfig) -> Self {
        let minutes_per_day = config
            .calendar
            .minutes_per_hour
            .saturating_mul(config.calendar.hours_per_day)
            .max(1);
        Self {
            growth: config.growth.clone(),
            species: config.species.clone(),
            minutes_per_day,
            modifier: modifiers::from_config(config.growth.seasonal_modifiers),
        }
    }

    /// Replace the seasonal modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Box<dyn SeasonalModifier>) -> Self {
        self.modifier = modifier;
        self
    }

    /// Apply `elapsed` to the farm and return the events it caused,
    /// without publishing them.
    pub fn step(&self, farm: &mut Farm, elapsed: Elapsed) -> Vec<SimEvent> {
        let Farm {
            animals,
            inventory,
            statistics,
            ..
        } = farm;

        let mut events = Vec::new();

        // 1-2. Age and maturity, noting who has to eat.
        let mut rations: BTreeMap<FeedType, Vec<Ration>> = BTreeMap::new();
        for animal in animals.values_mut() {
            if let Some(ration) = self.age(animal, statistics, elapsed, &mut events) {
                rations
                    .entry(FeedType::for_species(animal.species))
                    .or_default()
                    .push(ration);
            }
        }

        // 3. Feed, one shared stock per feed type.
        for (feed, diners) in &rations {
            self.feed(*feed, diners, animals, inventory, &mut events);
        }

        // 4. Production
        for animal in animals.values_mut() {
            self.produce(animal, elapsed, inventory, &mut events);
        }

        debug!(
            minutes = elapsed.minutes,
            season = %elapsed.season,
            animals = animals.len(),
            events = events.len(),
            "Growth step applied"
        );
        events
    }

    /// [`step`](Self::step), then publish every event on `bus` in order.
    /// Returns the events as published.
    pub fn update(&self, farm: &mut Farm, elapsed: Elapsed, bus: &mut EventBus) -> Vec<SimEvent> {
        let events = self.step(farm, elapsed);
        bus.publish_all(events.iter().cloned());
        events
    }

    /// Age one animal and announce a stage change. Returns the feed it
    /// owes if it crossed a day boundary.
    fn age(
        &self,
        animal: &mut Animal,
        statistics: &mut Statistics,
        elapsed: Elapsed,
        events: &mut Vec<SimEvent>,
    ) -> Option<Ration> {
        let species = self.species.get(animal.species);

        let old_age = animal.age_minutes;
        animal.age_minutes = old_age.saturating_add(elapsed.minutes);

        let grown = ratio(animal.age_minutes, species.maturity_minutes).clamp(0.0, 1.0);
        animal.maturity = animal.maturity.max(grown);
        let stage = animal.stage();
        if stage != animal.last_seen_stage {
            animal.last_seen_stage = stage;
            events.push(SimEvent::AnimalMatured {
                animal_id: animal.id,
                species: animal.species,
                new_stage: stage,
            });
            if stage == LifeStage::Adult {
                statistics.record_raised(animal.species);
            }
        }

        let days = crossings(old_age, animal.age_minutes, self.minutes_per_day);
        let needed = species.feed_per_day.saturating_mul(days);
        (needed > 0).then_some(Ration {
            animal: animal.id,
            days,
            needed,
        })
    }

    /// Draw what `diners` owe of `feed` in one go. A short stock leaves
    /// every diner with the same fed fraction.
    fn feed(
        &self,
        feed: FeedType,
        diners: &[Ration],
        animals: &mut BTreeMap<AnimalId, Animal>,
        inventory: &mut Inventory,
        events: &mut Vec<SimEvent>,
    ) {
        let owed = diners
            .iter()
            .fold(0_u64, |sum, ration| sum.saturating_add(ration.needed));
        if owed == 0 {
            return;
        }
        let drawn = inventory.take(InventoryKey::feed(feed), owed);
        let fed = ratio(drawn, owed);
        let shares = apportion(drawn, owed, diners);

        for (ration, eaten) in diners.iter().zip(shares) {
            let Some(animal) = animals.get_mut(&ration.animal) else {
                continue;
            };
            let old = animal.health;
            let span = ratio(ration.days, 1);

            if drawn < owed {
                animal.hunger = fed.clamp(0.0, 1.0);
                let loss = self.growth.starvation_health_loss_per_day * (1.0 - fed) * span;
                animal.health = (old - loss).clamp(0.0, 1.0);
                events.push(SimEvent::FeedShortage {
                    animal_id: animal.id,
                    feed,
                    needed: ration.needed,
                    eaten,
                });
            } else {
                animal.hunger = 1.0;
                let gain = self.growth.fed_health_recovery_per_day * span;
                animal.health = (old + gain).clamp(0.0, 1.0);
            }

            if (animal.health - old).abs() > HEALTH_EPSILON {
                events.push(SimEvent::AnimalHealthChanged {
                    animal_id: animal.id,
                    old,
                    new: animal.health,
                });
            }
        }
    }

    fn produce(
        &self,
        animal: &mut Animal,
        elapsed: Elapsed,
        inventory: &mut Inventory,
        events: &mut Vec<SimEvent>,
    ) {
        let species = self.species.get(animal.species);
        if animal.maturity < 1.0 || animal.health <= self.growth.production_health_floor {
            return;
        }

        let adult_minutes = animal.age_minutes.saturating_sub(species.maturity_minutes);
        let eligible = elapsed.minutes.min(adult_minutes);
        let timer = animal.production_timer_minutes.saturating_add(eligible);
        let interval = self.interval(species, elapsed.season);
        let quantity = timer.checked_div(interval).unwrap_or(0);
        animal.production_timer_minutes = timer.checked_rem(interval).unwrap_or(0);
        if quantity == 0 {
            return;
        }

        let quality = Quality::from_health(animal.health);
        inventory.add(InventoryKey::new(species.product, quality), quantity);
        events.push(SimEvent::AnimalProduced {
            animal_id: animal.id,
            goods: species.product,
            quality,
            quantity,
        });
    }

    /// Minutes per product in `season`: the configured interval divided
    /// by the seasonal production multiplier, rounded, at least 1.
    fn interval(&self, species: &SpeciesConfig, season: Season) -> u64 {
        let base = species.production_interval_minutes.max(1);
        let multiplier = self.modifier.production(season);
        if multiplier <= Decimal::ZERO {
            return base;
        }
        Decimal::from(base)
            .checked_div(multiplier)
            .and_then(|scaled| scaled.round().to_u64())
            .map_or(base, |scaled| scaled.max(1))
    }
}

/// `numerator / denominator` as a float.
#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator as f64
}

/// Multiples of `unit` in `(before, after]`.
fn crossings(before: u64, after: u64, unit: u64) -> u64 {
    let lo = before.checked_div(unit).unwrap_or(0);
    let hi = after.checked_div(unit).unwrap_or(0);
    hi.saturating_sub(lo)
}

/// Split `drawn` units across `diners` in proportion to what each owes.
/// Shares are floored; the leftover goes one unit each to the first diners
/// still short, so the shares always sum to `drawn`.
fn apportion(drawn: u64, owed: u64, diners: &[Ration]) -> Vec<u64> {
    let mut shares: Vec<u64> = diners
        .iter()
        .map(|ration| {
            u128::from(ration.needed)
                .checked_mul(u128::from(drawn))
                .and_then(|scaled| scaled.checked_div(u128::from(owed)))
                .and_then(|share| u64::try_from(share).ok())
                .unwrap_or(0)
        })
        .collect();

    let allotted = shares
        .iter()
        .fold(0_u64, |sum, share| sum.saturating_add(*share));
    let mut leftover = drawn.saturating_sub(allotted);
    for (share, ration) in shares.iter_mut().zip(diners) {
        if leftover == 0 {
            break;
        }
        if *share < ration.needed {
            *share = share.saturating_add(1);
            leftover = leftover.saturating_sub(1);
        }
    }
    shares
}
