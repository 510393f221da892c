//! Buying, selling, building, and upgrading.
//!
//! Every operation validates first and mutates only once nothing can fail,
//! so an `Err` always leaves the farm untouched. Successful operations
//! return a [`Receipt`] carrying the events they caused; publishing them is
//! the caller's job.

use ranch_events::SimEvent;
use ranch_types::{
    Animal, AnimalId, Building, BuildingId, BuildingKind, Decoration, DecorationId,
    DecorationKind, Direction, Farm, FeedType, GridPosition, Inventory, InventoryKey, Season,
    Species,
};
use tracing::info;

use crate::config::{EconomyConfig, SimulationConfig, SpeciesTable};
use crate::modifiers::{self, SeasonalModifier};
use crate::pricing;

/// Errors returned by economy operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    /// The farm cannot afford the purchase.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Price of the purchase.
        needed: u64,
        /// Current balance.
        available: u64,
    },

    /// No building with this id exists.
    #[error("building not found: {building_id}")]
    BuildingNotFound {
        /// The missing building.
        building_id: BuildingId,
    },

    /// No animal with this id exists.
    #[error("animal not found: {animal_id}")]
    AnimalNotFound {
        /// The missing animal.
        animal_id: AnimalId,
    },

    /// The building does not house this species.
    #[error("a {kind} cannot house a {species}")]
    WrongHousing {
        /// Species being housed.
        species: Species,
        /// Kind of the target building.
        kind: BuildingKind,
    },

    /// The building has no free slot.
    #[error("building is full ({capacity} animals)")]
    BuildingFull {
        /// Its current capacity.
        capacity: usize,
    },

    /// The building is already at its top level.
    #[error("building already at max level {level}")]
    MaxLevel {
        /// The level it is at.
        level: u8,
    },

    /// The inventory holds no products at all.
    #[error("nothing to sell")]
    NothingToSell,

    /// Fewer units on hand than requested.
    #[error("not enough {key} to sell: requested {requested}, have {available}")]
    NotEnoughGoods {
        /// What was asked for.
        key: InventoryKey,
        /// Units requested.
        requested: u64,
        /// Units on hand.
        available: u64,
    },

    /// A quantity of zero, or goods that cannot be traded this way.
    #[error("invalid quantity: {reason}")]
    InvalidQuantity {
        /// What is wrong.
        reason: String,
    },
}

/// Outcome of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<T> {
    /// What the operation produced (new id, revenue, level, ...).
    pub value: T,
    /// Events to publish, in order.
    pub events: Vec<SimEvent>,
}

/// Price of a decoration.
pub const fn decoration_price(kind: DecorationKind) -> u64 {
    match kind {
        DecorationKind::HayBale | DecorationKind::GardenGnome | DecorationKind::Mailbox => 50,
        DecorationKind::FlowerBed | DecorationKind::Bench | DecorationKind::Signpost => 75,
        DecorationKind::Scarecrow | DecorationKind::WaterTrough => 100,
        DecorationKind::PumpkinPatch | DecorationKind::LampPost => 125,
        DecorationKind::Tree | DecorationKind::PicnicTable => 150,
        DecorationKind::WoodenCart => 175,
        DecorationKind::WaterWell => 200,
        DecorationKind::DecorativeSilo => 300,
        DecorationKind::Fountain => 350,
        DecorationKind::Pond => 400,
        DecorationKind::Windmill => 500,
    }
}

/// Trading rules for one farm.
pub struct Economy {
    economy: EconomyConfig,
    species: SpeciesTable,
    modifier: Box<dyn SeasonalModifier>,
}

impl std::fmt::Debug for Economy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Economy")
            .field("economy", &self.economy)
            .field("species", &self.species)
            .finish_non_exhaustive()
    }
}

impl Economy {
    /// Build from configuration.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            economy: config.economy.clone(),
            species: config.species.clone(),
            modifier: modifiers::from_config(config.growth.seasonal_modifiers),
        }
    }

    /// Replace the seasonal price modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Box<dyn SeasonalModifier>) -> Self {
        self.modifier = modifier;
        self
    }

    /// What one unit of `key` sells for in `season`.
    pub fn quote(&self, key: InventoryKey, season: Season) -> u64 {
        pricing::unit_price_in_season(
            &self.economy.prices,
            self.modifier.as_ref(),
            season,
            key.goods,
            key.quality,
        )
    }

    /// Sale value of everything in `inventory` at base prices.
    pub fn inventory_value(&self, inventory: &Inventory) -> u64 {
        pricing::inventory_value(&self.economy.prices, inventory)
    }

    // -----------------------------------------------------------------------
    // Purchases
    // -----------------------------------------------------------------------

    /// Buy a baby of `species` and house it in `building_id`.
    pub fn purchase_animal(
        &self,
        farm: &mut Farm,
        species: Species,
        building_id: BuildingId,
    ) -> Result<Receipt<AnimalId>, EconomyError> {
        let building = farm
            .buildings
            .get(&building_id)
            .ok_or(EconomyError::BuildingNotFound { building_id })?;
        check_housing(building, species)?;
        let price = self.species.get(species).purchase_price;
        let paid = charge(farm, price)?;

        let ordinal = farm.count_species(species).saturating_add(1);
        let animal = Animal::newborn(species, format!("{species} {ordinal}"), Some(building_id));
        let animal_id = animal.id;
        farm.animals.insert(animal_id, animal);
        if let Some(building) = farm.buildings.get_mut(&building_id) {
            building.housed.insert(animal_id);
        }

        info!(%animal_id, %species, %building_id, price, "Animal purchased");
        Ok(Receipt {
            value: animal_id,
            events: vec![
                SimEvent::AnimalPurchased {
                    animal_id,
                    species,
                    building_id,
                    price,
                },
                paid,
            ],
        })
    }

    /// Buy and place a level-1 building.
    pub fn purchase_building(
        &self,
        farm: &mut Farm,
        kind: BuildingKind,
        position: GridPosition,
    ) -> Result<Receipt<BuildingId>, EconomyError> {
        let price = self.economy.buildings.purchase(kind);
        let paid = charge(farm, price)?;

        let building = Building::new(kind, position);
        let building_id = building.id;
        farm.buildings.insert(building_id, building);

        info!(%building_id, %kind, price, "Building purchased");
        Ok(Receipt {
            value: building_id,
            events: vec![
                SimEvent::BuildingPurchased {
                    building_id,
                    kind,
                    price,
                },
                paid,
            ],
        })
    }

    /// Raise a building one level. Returns the new level.
    pub fn upgrade_building(
        &self,
        farm: &mut Farm,
        building_id: BuildingId,
    ) -> Result<Receipt<u8>, EconomyError> {
        let building = farm
            .buildings
            .get(&building_id)
            .ok_or(EconomyError::BuildingNotFound { building_id })?;
        if building.level >= BuildingKind::MAX_LEVEL {
            return Err(EconomyError::MaxLevel {
                level: building.level,
            });
        }
        let price = self.economy.buildings.upgrade(building.kind, building.level);
        let level = building.level.saturating_add(1);
        let paid = charge(farm, price)?;
        if let Some(building) = farm.buildings.get_mut(&building_id) {
            building.level = level;
        }

        info!(%building_id, level, price, "Building upgraded");
        Ok(Receipt {
            value: level,
            events: vec![
                SimEvent::BuildingUpgraded {
                    building_id,
                    level,
                    price,
                },
                paid,
            ],
        })
    }

    /// Buy and place a decoration.
    pub fn purchase_decoration(
        &self,
        farm: &mut Farm,
        kind: DecorationKind,
        position: GridPosition,
        direction: Direction,
    ) -> Result<Receipt<DecorationId>, EconomyError> {
        let price = decoration_price(kind);
        let paid = charge(farm, price)?;

        let decoration_id = DecorationId::new();
        farm.decorations.insert(
            decoration_id,
            Decoration {
                id: decoration_id,
                kind,
                position,
                direction,
            },
        );

        info!(%decoration_id, ?kind, price, "Decoration purchased");
        Ok(Receipt {
            value: decoration_id,
            events: vec![
                SimEvent::DecorationPurchased {
                    decoration_id,
                    kind,
                    price,
                },
                paid,
            ],
        })
    }

    /// Buy `units` of feed into inventory. Returns the price paid.
    pub fn purchase_feed(
        &self,
        farm: &mut Farm,
        feed: FeedType,
        units: u64,
    ) -> Result<Receipt<u64>, EconomyError> {
        if units == 0 {
            return Err(EconomyError::InvalidQuantity {
                reason: "cannot buy zero feed".to_owned(),
            });
        }
        let price = pricing::feed_bundle_cost(self.economy.feed.per_hundred(feed), units);
        let paid = charge(farm, price)?;
        farm.inventory.add(InventoryKey::feed(feed), units);

        info!(?feed, units, price, "Feed purchased");
        Ok(Receipt {
            value: price,
            events: vec![SimEvent::FeedPurchased { feed, units, price }, paid],
        })
    }

    /// Move an animal into another building.
    pub fn rehouse_animal(
        &self,
        farm: &mut Farm,
        animal_id: AnimalId,
        building_id: BuildingId,
    ) -> Result<Receipt<()>, EconomyError> {
        let animal = farm
            .animals
            .get(&animal_id)
            .ok_or(EconomyError::AnimalNotFound { animal_id })?;
        let building = farm
            .buildings
            .get(&building_id)
            .ok_or(EconomyError::BuildingNotFound { building_id })?;
        let unchanged = Receipt {
            value: (),
            events: Vec::new(),
        };
        if animal.housing == Some(building_id) {
            return Ok(unchanged);
        }
        check_housing(building, animal.species)?;

        let previous = animal.housing;
        if let Some(old) = previous.and_then(|id| farm.buildings.get_mut(&id)) {
            old.housed.remove(&animal_id);
        }
        if let Some(building) = farm.buildings.get_mut(&building_id) {
            building.housed.insert(animal_id);
        }
        if let Some(animal) = farm.animals.get_mut(&animal_id) {
            animal.housing = Some(building_id);
        }

        info!(%animal_id, %building_id, "Animal rehoused");
        Ok(unchanged)
    }

    // -----------------------------------------------------------------------
    // Sales
    // -----------------------------------------------------------------------

    /// Sell `quantity` units of `key` at `season` prices. Returns revenue.
    pub fn sell_goods(
        &self,
        farm: &mut Farm,
        key: InventoryKey,
        quantity: u64,
        season: Season,
    ) -> Result<Receipt<u64>, EconomyError> {
        if quantity == 0 {
            return Err(EconomyError::InvalidQuantity {
                reason: "cannot sell zero units".to_owned(),
            });
        }
        if key.goods.is_feed() {
            return Err(EconomyError::InvalidQuantity {
                reason: format!("{key} is feed and cannot be sold"),
            });
        }
        let available = farm.inventory.count(key);
        if available < quantity {
            return Err(EconomyError::NotEnoughGoods {
                key,
                requested: quantity,
                available,
            });
        }

        let revenue = self.quote(key, season).saturating_mul(quantity);
        farm.inventory.take(key, quantity);
        farm.statistics.record_goods_sold(key.goods, quantity, revenue);
        let mut events = vec![SimEvent::GoodsSold {
            key,
            quantity,
            revenue,
        }];
        events.extend(credit(farm, revenue));

        info!(%key, quantity, revenue, "Goods sold");
        Ok(Receipt {
            value: revenue,
            events,
        })
    }

    /// Sell every product in inventory. Feed is kept. Returns total revenue.
    pub fn sell_all_goods(
        &self,
        farm: &mut Farm,
        season: Season,
    ) -> Result<Receipt<u64>, EconomyError> {
        let lots: Vec<(InventoryKey, u64)> = farm
            .inventory
            .iter()
            .filter(|(key, count)| !key.goods.is_feed() && *count > 0)
            .collect();
        if lots.is_empty() {
            return Err(EconomyError::NothingToSell);
        }

        let mut total: u64 = 0;
        let mut events = Vec::with_capacity(lots.len().saturating_add(1));
        for (key, quantity) in lots {
            let revenue = self.quote(key, season).saturating_mul(quantity);
            farm.inventory.take(key, quantity);
            farm.statistics.record_goods_sold(key.goods, quantity, revenue);
            total = total.saturating_add(revenue);
            events.push(SimEvent::GoodsSold {
                key,
                quantity,
                revenue,
            });
        }
        events.extend(credit(farm, total));

        info!(revenue = total, "Sold all goods");
        Ok(Receipt {
            value: total,
            events,
        })
    }

    /// Sell an animal and remove it from its building. Returns the price.
    pub fn sell_animal(
        &self,
        farm: &mut Farm,
        animal_id: AnimalId,
    ) -> Result<Receipt<u64>, EconomyError> {
        let animal = farm
            .animals
            .remove(&animal_id)
            .ok_or(EconomyError::AnimalNotFound { animal_id })?;
        if let Some(building) = animal.housing.and_then(|id| farm.buildings.get_mut(&id)) {
            building.housed.remove(&animal_id);
        }

        let price = pricing::animal_sale_value(self.species.get(animal.species), &animal);
        farm.statistics.record_animal_sold(animal.species, price);
        let mut events = vec![SimEvent::AnimalSold {
            animal_id,
            species: animal.species,
            price,
        }];
        events.extend(credit(farm, price));

        info!(%animal_id, species = %animal.species, price, "Animal sold");
        Ok(Receipt {
            value: price,
            events,
        })
    }
}

fn check_housing(building: &Building, species: Species) -> Result<(), EconomyError> {
    if !building.accepts(species) {
        return Err(EconomyError::WrongHousing {
            species,
            kind: building.kind,
        });
    }
    if !building.has_room() {
        return Err(EconomyError::BuildingFull {
            capacity: building.capacity(),
        });
    }
    Ok(())
}

/// Deduct `price`, or fail without touching the balance.
fn charge(farm: &mut Farm, price: u64) -> Result<SimEvent, EconomyError> {
    let old = farm.money;
    let new = old
        .checked_sub(price)
        .ok_or(EconomyError::InsufficientFunds {
            needed: price,
            available: old,
        })?;
    farm.money = new;
    Ok(SimEvent::MoneyChanged { old, new })
}

/// Add `amount` to the balance.
fn credit(farm: &mut Farm, amount: u64) -> Option<SimEvent> {
    if amount == 0 {
        return None;
    }
    let old = farm.money;
    farm.money = old.saturating_add(amount);
    farm.statistics.observe_balance(farm.money);
    Some(SimEvent::MoneyChanged {
        old,
        new: farm.money,
    })
}
