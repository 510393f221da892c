//! Seasonal multipliers for production and prices.
//!
//! Growth and pricing both consult a [`SeasonalModifier`]. The default,
//! [`Neutral`], returns 1 everywhere so balance is season-independent.
//! [`SeasonTable`] carries the seasonal production and price curves and
//! is switched on with `growth.seasonal_modifiers: true`.

use ranch_types::{GoodsType, Season};
use rust_decimal::Decimal;

/// Per-season multipliers consulted by growth and pricing.
pub trait SeasonalModifier: Send + Sync {
    /// Multiplier on production rate. Growth divides each species'
    /// production interval by it, so `1.1` is a product every
    /// `interval / 1.1` minutes.
    fn production(&self, season: Season) -> Decimal;

    /// Multiplier on the unit price of `goods`.
    fn price(&self, season: Season, goods: GoodsType) -> Decimal;
}

/// Every season is ordinary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neutral;

impl SeasonalModifier for Neutral {
    fn production(&self, _season: Season) -> Decimal {
        Decimal::ONE
    }

    fn price(&self, _season: Season, _goods: GoodsType) -> Decimal {
        Decimal::ONE
    }
}

/// Seasonal balance curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonTable;

/// Tenths, e.g. `tenths(11)` is `1.1`.
const fn tenths(n: u32) -> Decimal {
    Decimal::from_parts(n, 0, 0, false, 1)
}

/// Hundredths, e.g. `hundredths(115)` is `1.15`.
const fn hundredths(n: u32) -> Decimal {
    Decimal::from_parts(n, 0, 0, false, 2)
}

impl SeasonalModifier for SeasonTable {
    fn production(&self, season: Season) -> Decimal {
        match season {
            Season::Spring => tenths(11),
            Season::Summer => Decimal::ONE,
            Season::Fall => hundredths(115),
            Season::Winter => tenths(8),
        }
    }

    fn price(&self, season: Season, goods: GoodsType) -> Decimal {
        match (season, goods) {
            (Season::Spring, GoodsType::Egg) => tenths(12),
            (Season::Winter, GoodsType::Egg) => tenths(13),
            (Season::Summer, GoodsType::Milk) => tenths(9),
            (Season::Fall, GoodsType::Truffle) => tenths(13),
            (Season::Winter, GoodsType::Truffle) => tenths(8),
            (Season::Winter, GoodsType::Milk) => tenths(12),
            _ => Decimal::ONE,
        }
    }
}

/// The modifier selected by configuration.
pub fn from_config(seasonal: bool) -> Box<dyn SeasonalModifier> {
    if seasonal {
        Box::new(SeasonTable)
    } else {
        Box::new(Neutral)
    }
}
