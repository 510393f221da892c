//! Derived calendar time.
//!
//! [`FarmTime`] is computed from the activity counter and never persisted.
//! Construct it through the clock in `ranch-core`; this module only holds
//! the value and its presentation helpers.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{Season, TimeOfDay};

/// A point on the farm calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FarmTime {
    /// Year, starting at 1.
    pub year: u64,
    /// Season within the year.
    pub season: Season,
    /// Day within the season, starting at 1.
    pub day_in_season: u64,
    /// Hour of the day.
    pub hour: u64,
    /// Minute of the hour.
    pub minute: u64,
}

impl FarmTime {
    /// Coarse phase of the day.
    pub const fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour)
    }

    /// Daylight runs from 06:00 up to, not including, 20:00.
    pub const fn is_daytime(&self) -> bool {
        self.hour >= 6 && self.hour < 20
    }

    /// Clock face, e.g. `"06:05"`.
    pub fn clock_label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Calendar date, e.g. `"Spring Day 1, Year 1"`.
    pub fn date_label(&self) -> String {
        format!(
            "{} Day {}, Year {}",
            self.season.name(),
            self.day_in_season,
            self.year
        )
    }
}

impl fmt::Display for FarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_label(), self.clock_label())
    }
}
