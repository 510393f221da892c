//! Farm calendar derived from the activity counter.
//!
//! The counter in `Statistics::total_activity_units` is the single source
//! of truth for time. [`TimeSystem`] turns a counter value into a
//! [`FarmTime`] by integer division and remainder, and reports which
//! calendar boundaries an advance crossed.
//!
//! # Design Principles
//!
//! - All derivations use checked arithmetic (no silent overflow).
//! - Nothing here reads a wall clock. The same counter always yields the
//!   same [`FarmTime`], however it was reached.
//! - Boundaries are counted, not enumerated, so a jump of a million units
//!   costs the same as a jump of one.

use ranch_types::{FarmTime, Season};

use crate::config::CalendarConfig;

/// Number of seasons in a year.
const SEASONS_PER_YEAR: u64 = 4;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The counter or calendar minute would exceed `u64::MAX`.
    #[error("activity counter overflow: {context}")]
    CounterOverflow {
        /// Which computation overflowed.
        context: String,
    },

    /// Invalid calendar configuration (e.g. zero hours per day).
    #[error("invalid calendar configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// A calendar unit whose boundaries an advance can cross.
///
/// Ordered finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundaryKind {
    /// A minute rolled over.
    Minute,
    /// An hour rolled over.
    Hour,
    /// A day rolled over.
    Day,
    /// A season rolled over.
    Season,
}

/// How many boundaries of one kind an advance crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// The unit.
    pub kind: BoundaryKind,
    /// Boundaries crossed, at least 1.
    pub crossed: u64,
}

/// Result of [`TimeSystem::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Counter before the advance.
    pub previous_counter: u64,
    /// Counter after the advance.
    pub new_counter: u64,
    /// Simulated minutes between the two.
    pub elapsed_minutes: u64,
    /// Calendar time at `new_counter`.
    pub time: FarmTime,
    /// Crossed boundaries, one entry per kind, finest first.
    pub boundaries: Vec<Boundary>,
}

impl Advance {
    /// Boundaries of `kind` crossed, 0 if none.
    pub fn crossed(&self, kind: BoundaryKind) -> u64 {
        self.boundaries
            .iter()
            .find(|b| b.kind == kind)
            .map_or(0, |b| b.crossed)
    }
}

/// Converts activity counts into calendar time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSystem {
    minutes_per_unit: u64,
    offset: u64,
    minutes_per_hour: u64,
    hours_per_day: u64,
    days_per_season: u64,
    minutes_per_day: u64,
    minutes_per_season: u64,
}

impl TimeSystem {
    /// Build a time system from calendar configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any unit length is zero or
    /// a derived length overflows.
    pub fn new(config: &CalendarConfig) -> Result<Self, ClockError> {
        for (name, value) in [
            ("minutes_per_hour", config.minutes_per_hour),
            ("hours_per_day", config.hours_per_day),
            ("days_per_season", config.days_per_season),
            ("minutes_per_unit", config.minutes_per_unit),
        ] {
            if value == 0 {
                return Err(ClockError::InvalidConfig {
                    reason: format!("{name} must be at least 1"),
                });
            }
        }

        let minutes_per_day = config
            .minutes_per_hour
            .checked_mul(config.hours_per_day)
            .ok_or_else(|| ClockError::InvalidConfig {
                reason: "minutes per day overflow".to_owned(),
            })?;
        let minutes_per_season = minutes_per_day
            .checked_mul(config.days_per_season)
            .ok_or_else(|| ClockError::InvalidConfig {
                reason: "minutes per season overflow".to_owned(),
            })?;

        Ok(Self {
            minutes_per_unit: config.minutes_per_unit,
            offset: config.starting_offset_minutes,
            minutes_per_hour: config.minutes_per_hour,
            hours_per_day: config.hours_per_day,
            days_per_season: config.days_per_season,
            minutes_per_day,
            minutes_per_season,
        })
    }

    /// Simulated minutes per activity unit.
    pub const fn minutes_per_unit(&self) -> u64 {
        self.minutes_per_unit
    }

    /// Minutes in one calendar hour.
    pub const fn minutes_per_hour(&self) -> u64 {
        self.minutes_per_hour
    }

    /// Minutes in one calendar day.
    pub const fn minutes_per_day(&self) -> u64 {
        self.minutes_per_day
    }

    /// Calendar time for a counter value.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CounterOverflow`] if the counter is too large
    /// to express in minutes.
    pub fn derive_time(&self, counter: u64) -> Result<FarmTime, ClockError> {
        let minute_of_calendar = self.calendar_minute(counter)?;
        Ok(self.decompose(minute_of_calendar))
    }

    /// Move the counter forward by `units` and report what changed.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CounterOverflow`] if the new counter or its
    /// minute value would exceed `u64::MAX`.
    pub fn advance(&self, previous_counter: u64, units: u64) -> Result<Advance, ClockError> {
        let new_counter =
            previous_counter
                .checked_add(units)
                .ok_or_else(|| ClockError::CounterOverflow {
                    context: format!("{previous_counter} + {units}"),
                })?;

        let before = self.calendar_minute(previous_counter)?;
        let after = self.calendar_minute(new_counter)?;
        let elapsed_minutes = after.saturating_sub(before);

        let mut boundaries = Vec::with_capacity(4);
        for (kind, unit) in [
            (BoundaryKind::Minute, 1),
            (BoundaryKind::Hour, self.minutes_per_hour),
            (BoundaryKind::Day, self.minutes_per_day),
            (BoundaryKind::Season, self.minutes_per_season),
        ] {
            let crossed = crossings(before, after, unit);
            if crossed > 0 {
                boundaries.push(Boundary { kind, crossed });
            }
        }

        Ok(Advance {
            previous_counter,
            new_counter,
            elapsed_minutes,
            time: self.decompose(after),
            boundaries,
        })
    }

    fn calendar_minute(&self, counter: u64) -> Result<u64, ClockError> {
        counter
            .checked_mul(self.minutes_per_unit)
            .and_then(|minutes| minutes.checked_add(self.offset))
            .ok_or_else(|| ClockError::CounterOverflow {
                context: format!("counter {counter} in minutes"),
            })
    }

    fn decompose(&self, minute_of_calendar: u64) -> FarmTime {
        // Divisors are non-zero by construction, so the fallbacks never fire.
        let minute = minute_of_calendar
            .checked_rem(self.minutes_per_hour)
            .unwrap_or(0);
        let total_hours = minute_of_calendar
            .checked_div(self.minutes_per_hour)
            .unwrap_or(0);
        let hour = total_hours.checked_rem(self.hours_per_day).unwrap_or(0);
        let total_days = total_hours.checked_div(self.hours_per_day).unwrap_or(0);
        let day_in_season = total_days
            .checked_rem(self.days_per_season)
            .unwrap_or(0)
            .saturating_add(1);
        let total_seasons = total_days.checked_div(self.days_per_season).unwrap_or(0);
        let season = Season::from_index(total_seasons.checked_rem(SEASONS_PER_YEAR).unwrap_or(0));
        let year = total_seasons
            .checked_div(SEASONS_PER_YEAR)
            .unwrap_or(0)
            .saturating_add(1);

        FarmTime {
            year,
            season,
            day_in_season,
            hour,
            minute,
        }
    }
}

/// Multiples of `unit` in `(before, after]`.
fn crossings(before: u64, after: u64, unit: u64) -> u64 {
    let lo = before.checked_div(unit).unwrap_or(0);
    let hi = after.checked_div(unit).unwrap_or(0);
    hi.saturating_sub(lo)
}
