//! Pure pricing functions.
//!
//! All money math runs in [`Decimal`] so that `10 x 1.3` is exactly `13`,
//! then truncates to whole coins. Nothing here reads state beyond its
//! arguments.

use ranch_types::{Animal, GoodsType, Inventory, Quality, Season};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::config::{PriceTable, SpeciesConfig};
use crate::modifiers::SeasonalModifier;

/// Floor an animal's maturity at this fraction of full value when selling.
const SALE_MATURITY_FLOOR: f64 = 0.3;

/// Floor an animal's health at this fraction of full value when selling.
const SALE_HEALTH_FLOOR: f64 = 0.5;

/// Decimal places kept when converting maturity and health.
const FRACTION_PLACES: u32 = 6;

/// Price of one unit of `goods` at `quality`.
pub fn unit_price(table: &PriceTable, goods: GoodsType, quality: Quality) -> u64 {
    scale(table.base.get(goods), &[table.quality.get(quality)])
}

/// [`unit_price`] with a seasonal multiplier applied on top.
pub fn unit_price_in_season(
    table: &PriceTable,
    modifier: &dyn SeasonalModifier,
    season: Season,
    goods: GoodsType,
    quality: Quality,
) -> u64 {
    scale(
        table.base.get(goods),
        &[table.quality.get(quality), modifier.price(season, goods)],
    )
}

/// Total sale value of everything in `inventory`.
pub fn inventory_value(table: &PriceTable, inventory: &Inventory) -> u64 {
    inventory.iter().fold(0_u64, |total, (key, count)| {
        let line = unit_price(table, key.goods, key.quality).saturating_mul(count);
        total.saturating_add(line)
    })
}

/// What a buyer pays for `animal`.
///
/// Young or sickly animals still fetch a floor: maturity counts as at least
/// 0.3 and health as at least 0.5.
pub fn animal_sale_value(species: &SpeciesConfig, animal: &Animal) -> u64 {
    let maturity = fraction(animal.maturity.max(SALE_MATURITY_FLOOR));
    let health = fraction(animal.health.max(SALE_HEALTH_FLOOR));
    scale(species.base_sale_price, &[maturity, health])
}

/// A `[0, 1]` float as a decimal with float noise rounded off.
fn fraction(value: f64) -> Decimal {
    Decimal::from_f64(value.clamp(0.0, 1.0))
        .map_or(Decimal::ONE, |d| d.round_dp(FRACTION_PLACES))
}

/// Cost of `units` feed at `per_hundred` coins per 100 units.
pub const fn feed_bundle_cost(per_hundred: u64, units: u64) -> u64 {
    match per_hundred.checked_mul(units) {
        Some(total) => total / 100,
        None => u64::MAX,
    }
}

/// `base` times every factor, truncated to whole coins. Saturates at
/// `u64::MAX` rather than overflowing.
fn scale(base: u64, factors: &[Decimal]) -> u64 {
    let product = factors
        .iter()
        .try_fold(Decimal::from(base), |acc, factor| acc.checked_mul(*factor));
    product
        .and_then(|value| value.trunc().to_u64())
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ranch_types::{InventoryKey, Species};

    use super::*;
    use crate::config::{BasePrices, QualityMultipliers, SimulationConfig};
    use crate::modifiers::{Neutral, SeasonTable};

    fn table() -> PriceTable {
        PriceTable::default()
    }

    #[test]
    fn premium_egg_at_double_multiplier_is_twenty() {
        let table = PriceTable {
            base: BasePrices {
                egg: 10,
                ..BasePrices::default()
            },
            quality: QualityMultipliers {
                premium: Decimal::TWO,
                ..QualityMultipliers::default()
            },
        };
        let key: InventoryKey = "egg_premium".parse().unwrap();
        assert_eq!(unit_price(&table, key.goods, key.quality), 20);
    }

    #[test]
    fn default_multipliers_truncate_to_whole_coins() {
        let t = table();
        assert_eq!(unit_price(&t, GoodsType::Egg, Quality::Basic), 10);
        assert_eq!(unit_price(&t, GoodsType::Egg, Quality::Good), 13);
        assert_eq!(unit_price(&t, GoodsType::Milk, Quality::Good), 45);
        assert_eq!(unit_price(&t, GoodsType::Milk, Quality::Premium), 56);
        assert_eq!(unit_price(&t, GoodsType::Truffle, Quality::Artisan), 80);
        assert_eq!(unit_price(&t, GoodsType::CowFeed, Quality::Artisan), 0);
    }

    #[test]
    fn inventory_value_sums_every_line() {
        let mut inv = Inventory::new();
        inv.add(InventoryKey::new(GoodsType::Egg, Quality::Basic), 3);
        inv.add(InventoryKey::new(GoodsType::Milk, Quality::Artisan), 2);
        inv.add(InventoryKey::feed(GoodsType::ChickenFeed), 500);
        assert_eq!(inventory_value(&table(), &inv), 3 * 10 + 2 * 70);
        assert_eq!(inventory_value(&table(), &Inventory::new()), 0);
    }

    #[test]
    fn seasonal_hook_is_neutral_by_default() {
        let t = table();
        for season in Season::ORDER {
            assert_eq!(
                unit_price_in_season(&t, &Neutral, season, GoodsType::Truffle, Quality::Good),
                unit_price(&t, GoodsType::Truffle, Quality::Good)
            );
        }
        assert_eq!(
            unit_price_in_season(&t, &SeasonTable, Season::Fall, GoodsType::Truffle, Quality::Basic),
            52
        );
    }

    #[test]
    fn animal_value_has_floors() {
        let config = SimulationConfig::default();
        let cow = config.species.get(Species::Cow);
        let mut animal = Animal::newborn(Species::Cow, "Daisy", None);
        // maturity 0 -> 0.3, health 1.0
        assert_eq!(animal_sale_value(cow, &animal), 210);
        animal.maturity = 1.0;
        animal.health = 0.1;
        assert_eq!(animal_sale_value(cow, &animal), 350);
        animal.health = 1.0;
        assert_eq!(animal_sale_value(cow, &animal), 700);
    }

    #[test]
    fn feed_bundle_cost_is_per_hundred() {
        assert_eq!(feed_bundle_cost(50, 100), 50);
        assert_eq!(feed_bundle_cost(75, 250), 187);
        assert_eq!(feed_bundle_cost(u64::MAX, 2), u64::MAX);
    }
}
