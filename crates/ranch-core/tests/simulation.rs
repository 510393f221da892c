//! End-to-end scenarios for the ranch simulation driver.
//!
//! These run a [`Session`] the way the engine does: activity in, events
//! out, farm state checked at the end.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::cell::RefCell;
use std::rc::Rc;

use ranch_core::{BoundaryKind, Session, SimulationConfig};
use ranch_events::{EventKind, HandlerError, SimEvent};
use ranch_types::{
    BuildingKind, FeedType, GoodsType, GridPosition, InventoryKey, LifeStage, Quality, Season,
    Species,
};

fn stocked_coop(config: &SimulationConfig) -> Session {
    let mut session = Session::new(config).expect("default config is valid");
    let coop = session
        .purchase_building(BuildingKind::Coop, GridPosition::new(0, 0))
        .unwrap();
    session.purchase_animal(Species::Chicken, coop).unwrap();
    session.purchase_feed(FeedType::ChickenFeed, 100).unwrap();
    session
}

#[test]
fn one_big_jump_equals_many_small_steps() {
    let config = SimulationConfig::default();
    let mut stepwise = stocked_coop(&config);
    let mut jump = stocked_coop(&config);

    for _ in 0..3000 {
        stepwise.on_activity(1).unwrap();
    }
    jump.on_activity(3000).unwrap();

    assert_eq!(stepwise.now(), jump.now());
    assert_eq!(stepwise.counter(), jump.counter());
    assert_eq!(stepwise.farm().inventory, jump.farm().inventory);

    let a = stepwise.farm().animals.values().next().unwrap();
    let b = jump.farm().animals.values().next().unwrap();
    assert_eq!(a.age_minutes, b.age_minutes);
    assert_eq!(a.production_timer_minutes, b.production_timer_minutes);
    assert_eq!(a.stage(), LifeStage::Adult);
    assert_eq!(b.stage(), LifeStage::Adult);

    // Adult from minute 1500: six eggs in the remaining 1500 minutes.
    let eggs = InventoryKey::new(GoodsType::Egg, Quality::Artisan);
    assert_eq!(jump.farm().inventory.count(eggs), 6);
    assert_eq!(
        jump.farm()
            .inventory
            .count(InventoryKey::feed(FeedType::ChickenFeed)),
        98
    );
}

#[test]
fn reloading_the_counter_reproduces_the_calendar() {
    let config = SimulationConfig::default();
    let mut session = stocked_coop(&config);
    session.on_activity(12_345).unwrap();
    let farm = session.farm().clone();
    let now = session.now();

    let resumed = Session::with_farm(&config, farm).unwrap();
    assert_eq!(resumed.now(), now);
}

#[test]
fn season_jump_reports_each_boundary_kind_once() {
    let config = SimulationConfig::default();
    let mut session = stocked_coop(&config);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session
        .bus_mut()
        .subscribe_all(move |event, _| -> Result<(), HandlerError> {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

    let summary = session.on_activity(7 * 24 * 60).unwrap();

    assert!(summary.crossed(BoundaryKind::Season));
    assert_eq!(summary.time.season, Season::Summer);
    let seen = seen.borrow();
    let kinds: Vec<EventKind> = seen.iter().map(SimEvent::kind).collect();
    assert_eq!(
        &kinds[..4],
        &[
            EventKind::TimeAdvanced,
            EventKind::HourChanged,
            EventKind::DayChanged,
            EventKind::SeasonChanged
        ]
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == EventKind::SeasonChanged)
            .count(),
        1
    );
    assert!(seen.contains(&SimEvent::DayChanged {
        day: 1,
        season: Season::Summer,
        crossed: 7,
    }));
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == EventKind::AnimalMatured)
            .count(),
        1
    );
}

#[test]
fn failing_subscribers_do_not_stop_the_tick() {
    let config = SimulationConfig::default();
    let mut session = stocked_coop(&config);
    session
        .bus_mut()
        .subscribe(EventKind::TimeAdvanced, |_, _| {
            Err(HandlerError::new("display went away"))
        });

    let summary = session.on_activity(60).unwrap();

    assert_eq!(summary.handler_failures, 1);
    assert_eq!(session.counter(), 60);
}

#[test]
fn subscribers_can_chain_follow_up_events() {
    let config = SimulationConfig::default();
    let mut session = stocked_coop(&config);
    let hours = Rc::new(RefCell::new(0_u32));
    let count = Rc::clone(&hours);
    session
        .bus_mut()
        .subscribe(EventKind::DayChanged, |event, outbox| {
            if let SimEvent::DayChanged { crossed, .. } = event {
                outbox.publish(SimEvent::HourChanged {
                    hour: 0,
                    crossed: *crossed,
                });
            }
            Ok(())
        });
    session
        .bus_mut()
        .subscribe(EventKind::HourChanged, move |_, _| {
            *count.borrow_mut() += 1;
            Ok(())
        });

    session.on_activity(18 * 60).unwrap();

    // The tick's own HourChanged plus the follow-up.
    assert_eq!(*hours.borrow(), 2);
}

#[test]
fn short_seasons_from_yaml() {
    let config = SimulationConfig::parse("calendar:\n  days_per_season: 1\n").unwrap();
    let mut session = Session::new(&config).unwrap();

    let summary = session.on_activity(18 * 60).unwrap();

    assert_eq!(summary.time.season, Season::Summer);
    assert_eq!(summary.time.day_in_season, 1);
}

#[test]
fn selling_the_harvest() {
    let config = SimulationConfig::default();
    let mut session = stocked_coop(&config);
    session.on_activity(3000).unwrap();
    let before = session.farm().money;
    let value = session.inventory_value();

    let revenue = session.sell_all_goods().unwrap();

    assert_eq!(revenue, 6 * 20);
    assert_eq!(revenue, value);
    assert_eq!(session.farm().money, before + revenue);
    assert_eq!(session.farm().statistics.total_products_sold, 6);
}
