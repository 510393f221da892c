//! The running simulation for one farm.
//!
//! A [`Session`] owns the [`Farm`], its [`EventBus`], and the stateless
//! systems that act on it. External activity enters through
//! [`Session::on_activity`]; everything else (shop, market, debug jumps)
//! goes through the methods below so that every change is published.
//!
//! # Tick order
//!
//! 1. Advance the activity counter and derive the new calendar time
//! 2. Publish `TimeAdvanced`, then one event per crossed boundary kind,
//!    finest first
//! 3. Run growth for the elapsed minutes and publish its events

use ranch_events::{EventBus, SimEvent};
use ranch_types::{
    AnimalId, BuildingId, BuildingKind, DecorationId, DecorationKind, Direction, Farm, FarmTime,
    FeedType, GridPosition, InventoryKey, Species,
};
use tracing::{debug, info};

use crate::clock::{Boundary, BoundaryKind, ClockError, TimeSystem};
use crate::config::{ConfigError, SimulationConfig};
use crate::economy::{Economy, EconomyError, Receipt};
use crate::growth::{Elapsed, GrowthSystem};

/// Errors returned by [`Session`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Activity must move time forward.
    #[error("activity must be at least 1 unit, got {units}")]
    InvalidActivity {
        /// The rejected unit count.
        units: u64,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A shop or market operation was refused.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// The configuration is unusable.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },
}

/// What one call to [`Session::on_activity`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Counter value after the tick.
    pub counter: u64,
    /// Simulated minutes covered.
    pub elapsed_minutes: u64,
    /// Calendar time after the tick.
    pub time: FarmTime,
    /// Calendar boundaries crossed, finest first.
    pub boundaries: Vec<Boundary>,
    /// Top-level events published, in order.
    pub events: Vec<SimEvent>,
    /// Subscriber errors reported by the bus.
    pub handler_failures: usize,
    /// The session was paused and ignored the activity.
    pub paused: bool,
}

impl TickSummary {
    /// Whether a boundary of `kind` was crossed.
    pub fn crossed(&self, kind: BoundaryKind) -> bool {
        self.boundaries.iter().any(|b| b.kind == kind)
    }
}

/// One farm in motion.
#[derive(Debug)]
pub struct Session {
    farm: Farm,
    bus: EventBus,
    clock: TimeSystem,
    growth: GrowthSystem,
    economy: Economy,
    time: FarmTime,
    paused: bool,
}

impl Session {
    /// A brand-new farm with the configured starting balance.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] or [`SessionError::Clock`] if the
    /// configuration cannot drive a calendar.
    pub fn new(config: &SimulationConfig) -> Result<Self, SessionError> {
        Self::with_farm(config, Farm::new(config.economy.initial_money))
    }

    /// Resume an existing farm, e.g. one just loaded from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configuration is invalid, or
    /// [`SessionError::Clock`] if the farm's counter cannot be expressed as
    /// a calendar time.
    pub fn with_farm(config: &SimulationConfig, farm: Farm) -> Result<Self, SessionError> {
        config.validate()?;
        let clock = TimeSystem::new(&config.calendar)?;
        let time = clock.derive_time(farm.statistics.total_activity_units)?;
        info!(
            counter = farm.statistics.total_activity_units,
            time = %time,
            animals = farm.animals.len(),
            money = farm.money,
            "Session started"
        );
        Ok(Self {
            farm,
            bus: EventBus::new(),
            clock,
            growth: GrowthSystem::new(config),
            economy: Economy::new(config),
            time,
            paused: false,
        })
    }

    /// Replace the event bus, e.g. with one that keeps history.
    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The farm as it stands.
    pub const fn farm(&self) -> &Farm {
        &self.farm
    }

    /// Give up the session and keep the farm.
    pub fn into_farm(self) -> Farm {
        self.farm
    }

    /// The bus, for subscribing.
    pub const fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Current calendar time.
    pub const fn now(&self) -> FarmTime {
        self.time
    }

    /// Current activity counter.
    pub const fn counter(&self) -> u64 {
        self.farm.statistics.total_activity_units
    }

    /// Whether activity is currently ignored.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sale value of the whole inventory at base prices.
    pub fn inventory_value(&self) -> u64 {
        self.economy.inventory_value(&self.farm.inventory)
    }

    /// Current sale price of one unit of `key`.
    pub fn quote(&self, key: InventoryKey) -> u64 {
        self.economy.quote(key, self.time.season)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Stop reacting to activity.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!(counter = self.counter(), "Session paused");
        }
    }

    /// React to activity again.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!(counter = self.counter(), "Session resumed");
        }
    }

    /// Advance the simulation by `units` of external activity.
    ///
    /// A paused session returns a summary with `paused` set and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidActivity`] for zero units, or
    /// [`SessionError::Clock`] if the counter would overflow.
    pub fn on_activity(&mut self, units: u64) -> Result<TickSummary, SessionError> {
        if units == 0 {
            return Err(SessionError::InvalidActivity { units });
        }
        if self.paused {
            debug!(units, "Activity ignored while paused");
            return Ok(TickSummary {
                counter: self.counter(),
                elapsed_minutes: 0,
                time: self.time,
                boundaries: Vec::new(),
                events: Vec::new(),
                handler_failures: 0,
                paused: true,
            });
        }
        self.advance(units)
    }

    /// Jump forward by `hours` of calendar time, ignoring pause.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidActivity`] for zero hours, or
    /// [`SessionError::Clock`] if the counter would overflow.
    pub fn skip_hours(&mut self, hours: u64) -> Result<TickSummary, SessionError> {
        let minutes = hours.saturating_mul(self.clock.minutes_per_hour());
        let per_unit = self.clock.minutes_per_unit();
        let units = minutes
            .checked_div(per_unit)
            .unwrap_or(0)
            .saturating_add(u64::from(minutes.checked_rem(per_unit).unwrap_or(0) > 0));
        if units == 0 {
            return Err(SessionError::InvalidActivity { units });
        }
        info!(hours, units, "Skipping ahead");
        self.advance(units)
    }

    fn advance(&mut self, units: u64) -> Result<TickSummary, SessionError> {
        let advance = self.clock.advance(self.counter(), units)?;
        self.farm.statistics.total_activity_units = advance.new_counter;
        self.time = advance.time;

        let mut events = vec![SimEvent::TimeAdvanced {
            elapsed_minutes: advance.elapsed_minutes,
            total_activity_units: advance.new_counter,
        }];
        events.extend(
            advance
                .boundaries
                .iter()
                .filter_map(|boundary| self.boundary_event(*boundary)),
        );
        let mut report = self.bus.publish_all(events.iter().cloned());

        let elapsed = Elapsed::minutes(advance.elapsed_minutes).in_season(self.time.season);
        let lifecycle = self.growth.step(&mut self.farm, elapsed);
        let growth_report = self.bus.publish_all(lifecycle.iter().cloned());
        report.failures.extend(growth_report.failures);
        events.extend(lifecycle);

        debug!(
            counter = advance.new_counter,
            time = %self.time,
            events = events.len(),
            "Activity applied"
        );
        Ok(TickSummary {
            counter: advance.new_counter,
            elapsed_minutes: advance.elapsed_minutes,
            time: self.time,
            boundaries: advance.boundaries,
            events,
            handler_failures: report.failures.len(),
            paused: false,
        })
    }

    fn boundary_event(&self, boundary: Boundary) -> Option<SimEvent> {
        let crossed = boundary.crossed;
        match boundary.kind {
            BoundaryKind::Minute => None,
            BoundaryKind::Hour => Some(SimEvent::HourChanged {
                hour: self.time.hour,
                crossed,
            }),
            BoundaryKind::Day => Some(SimEvent::DayChanged {
                day: self.time.day_in_season,
                season: self.time.season,
                crossed,
            }),
            BoundaryKind::Season => Some(SimEvent::SeasonChanged {
                season: self.time.season,
                year: self.time.year,
                crossed,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Shop and market
    // -----------------------------------------------------------------------

    fn publish<T>(&mut self, receipt: Receipt<T>) -> T {
        self.bus.publish_all(receipt.events);
        receipt.value
    }

    /// Buy an animal into `building`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the purchase is refused.
    pub fn purchase_animal(
        &mut self,
        species: Species,
        building: BuildingId,
    ) -> Result<AnimalId, SessionError> {
        let receipt = self
            .economy
            .purchase_animal(&mut self.farm, species, building)?;
        Ok(self.publish(receipt))
    }

    /// Buy a building.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the purchase is refused.
    pub fn purchase_building(
        &mut self,
        kind: BuildingKind,
        position: GridPosition,
    ) -> Result<BuildingId, SessionError> {
        let receipt = self
            .economy
            .purchase_building(&mut self.farm, kind, position)?;
        Ok(self.publish(receipt))
    }

    /// Upgrade a building; returns its new level.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the upgrade is refused.
    pub fn upgrade_building(&mut self, building: BuildingId) -> Result<u8, SessionError> {
        let receipt = self.economy.upgrade_building(&mut self.farm, building)?;
        Ok(self.publish(receipt))
    }

    /// Buy a decoration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the purchase is refused.
    pub fn purchase_decoration(
        &mut self,
        kind: DecorationKind,
        position: GridPosition,
        direction: Direction,
    ) -> Result<DecorationId, SessionError> {
        let receipt =
            self.economy
                .purchase_decoration(&mut self.farm, kind, position, direction)?;
        Ok(self.publish(receipt))
    }

    /// Buy feed; returns the price paid.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the purchase is refused.
    pub fn purchase_feed(&mut self, feed: FeedType, units: u64) -> Result<u64, SessionError> {
        let receipt = self.economy.purchase_feed(&mut self.farm, feed, units)?;
        Ok(self.publish(receipt))
    }

    /// Move an animal to another building.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the move is refused.
    pub fn rehouse_animal(
        &mut self,
        animal: AnimalId,
        building: BuildingId,
    ) -> Result<(), SessionError> {
        let receipt = self
            .economy
            .rehouse_animal(&mut self.farm, animal, building)?;
        self.publish(receipt);
        Ok(())
    }

    /// Sell goods at this season's prices; returns revenue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the sale is refused.
    pub fn sell_goods(&mut self, key: InventoryKey, quantity: u64) -> Result<u64, SessionError> {
        let season = self.time.season;
        let receipt = self
            .economy
            .sell_goods(&mut self.farm, key, quantity, season)?;
        Ok(self.publish(receipt))
    }

    /// Sell every product; returns revenue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if there is nothing to sell.
    pub fn sell_all_goods(&mut self) -> Result<u64, SessionError> {
        let season = self.time.season;
        let receipt = self.economy.sell_all_goods(&mut self.farm, season)?;
        Ok(self.publish(receipt))
    }

    /// Sell an animal; returns the price.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Economy`] if the animal does not exist.
    pub fn sell_animal(&mut self, animal: AnimalId) -> Result<u64, SessionError> {
        let receipt = self.economy.sell_animal(&mut self.farm, animal)?;
        Ok(self.publish(receipt))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use ranch_events::{EventKind, HandlerError};
    use ranch_types::Season;

    use super::*;

    fn session() -> Session {
        Session::new(&SimulationConfig::default()).unwrap()
    }

    fn record(session: &mut Session) -> Rc<RefCell<Vec<EventKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session
            .bus_mut()
            .subscribe_all(move |event, _| -> Result<(), HandlerError> {
                sink.borrow_mut().push(event.kind());
                Ok(())
            });
        seen
    }

    #[test]
    fn new_session_starts_at_six_on_day_one() {
        let session = session();
        assert_eq!(session.counter(), 0);
        assert_eq!(session.now().hour, 6);
        assert_eq!(session.now().season, Season::Spring);
        assert_eq!(session.farm().money, 1500);
    }

    #[test]
    fn zero_activity_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.on_activity(0),
            Err(SessionError::InvalidActivity { units: 0 })
        ));
        assert_eq!(session.counter(), 0);
    }

    #[test]
    fn time_events_come_first_and_in_order() {
        let mut session = session();
        let seen = record(&mut session);

        // 06:00 + 18h lands on day 2 at midnight.
        let summary = session.on_activity(18 * 60).unwrap();

        assert!(summary.crossed(BoundaryKind::Day));
        assert_eq!(summary.time.day_in_season, 2);
        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::TimeAdvanced,
                EventKind::HourChanged,
                EventKind::DayChanged
            ]
        );
        assert_eq!(session.farm().statistics.total_activity_units, 18 * 60);
    }

    #[test]
    fn paused_session_ignores_activity() {
        let mut session = session();
        session.pause();
        let summary = session.on_activity(100).unwrap();
        assert!(summary.paused);
        assert_eq!(session.counter(), 0);

        session.resume();
        let summary = session.on_activity(100).unwrap();
        assert!(!summary.paused);
        assert_eq!(session.counter(), 100);
    }

    #[test]
    fn skip_hours_ignores_pause_and_rounds_up() {
        let config = SimulationConfig {
            calendar: crate::config::CalendarConfig {
                minutes_per_unit: 7,
                ..crate::config::CalendarConfig::default()
            },
            ..SimulationConfig::default()
        };
        let mut session = Session::new(&config).unwrap();
        session.pause();
        let summary = session.skip_hours(1).unwrap();
        // 60 minutes at 7 per unit needs 9 units.
        assert_eq!(session.counter(), 9);
        assert_eq!(summary.elapsed_minutes, 63);
        assert!(session.skip_hours(0).is_err());
    }

    #[test]
    fn shop_operations_publish_events() {
        let mut session = session();
        let seen = record(&mut session);

        let coop = session
            .purchase_building(BuildingKind::Coop, GridPosition::new(0, 0))
            .unwrap();
        session.purchase_animal(Species::Chicken, coop).unwrap();
        session.purchase_feed(FeedType::ChickenFeed, 100).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::BuildingPurchased,
                EventKind::MoneyChanged,
                EventKind::AnimalPurchased,
                EventKind::MoneyChanged,
                EventKind::FeedPurchased,
                EventKind::MoneyChanged,
            ]
        );
        assert_eq!(session.farm().money, 1500 - 500 - 80 - 50);
    }

    #[test]
    fn refused_operations_surface_as_economy_errors() {
        let mut session = session();
        let result = session.purchase_building(BuildingKind::Barn, GridPosition::new(0, 0));
        assert!(matches!(
            result,
            Err(SessionError::Economy {
                source: EconomyError::InsufficientFunds { .. }
            })
        ));
        assert!(session.sell_all_goods().is_err());
    }

    #[test]
    fn a_day_of_activity_grows_and_feeds_the_flock() {
        let mut session = session();
        let coop = session
            .purchase_building(BuildingKind::Coop, GridPosition::new(0, 0))
            .unwrap();
        let hen = session.purchase_animal(Species::Chicken, coop).unwrap();
        session.purchase_feed(FeedType::ChickenFeed, 100).unwrap();

        let summary = session.on_activity(24 * 60).unwrap();

        let animal = &session.farm().animals[&hen];
        assert_eq!(animal.age_minutes, 24 * 60);
        assert!(animal.maturity > 0.9);
        assert_eq!(
            session
                .farm()
                .inventory
                .count(InventoryKey::feed(FeedType::ChickenFeed)),
            99
        );
        assert!(
            summary
                .events
                .iter()
                .any(|e| e.kind() == EventKind::AnimalMatured)
        );
    }
}
