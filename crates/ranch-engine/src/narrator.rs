//! Bus subscriber that turns notable simulation events into lines for the
//! player.
//!
//! The session never prints; the shell drains the [`Feed`] after each
//! command.

use std::cell::RefCell;
use std::rc::Rc;

use ranch_events::{EventBus, SimEvent};
use ranch_types::LifeStage;

/// Lines waiting to be shown.
pub type Feed = Rc<RefCell<Vec<String>>>;

/// Subscribe a narrator to every event on `bus`.
pub fn attach(bus: &mut EventBus) -> Feed {
    let feed = Feed::default();
    let sink = Rc::clone(&feed);
    bus.subscribe_all(move |event, _| {
        if let Some(line) = describe(event) {
            sink.borrow_mut().push(line);
        }
        Ok(())
    });
    feed
}

/// A player-facing line for `event`, or `None` for routine ones.
pub fn describe(event: &SimEvent) -> Option<String> {
    let line = match event {
        SimEvent::DayChanged { day, season, .. } => format!("-- {season}, day {day} --"),
        SimEvent::SeasonChanged { season, year, .. } => {
            format!("{season} has come (year {year})")
        }
        SimEvent::AnimalMatured {
            species, new_stage, ..
        } => format!("A {species} is now {}", stage_word(*new_stage)),
        SimEvent::AnimalProduced {
            goods,
            quality,
            quantity,
            ..
        } => format!("+{quantity} {quality} {goods}"),
        SimEvent::FeedShortage {
            feed,
            needed,
            eaten,
            ..
        } => format!("Not enough feed: ate {eaten} of {needed} {}", feed.goods()),
        SimEvent::AnimalSold { species, price, .. } => format!("Sold a {species} for {price}"),
        SimEvent::GoodsSold {
            key,
            quantity,
            revenue,
        } => format!("Sold {quantity} {key} for {revenue}"),
        _ => return None,
    };
    Some(line)
}

const fn stage_word(stage: LifeStage) -> &'static str {
    match stage {
        LifeStage::Baby => "a baby",
        LifeStage::Teen => "a teen",
        LifeStage::Adult => "an adult",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ranch_types::{GoodsType, Quality, Season};

    use super::*;

    #[test]
    fn routine_events_stay_quiet() {
        assert!(
            describe(&SimEvent::TimeAdvanced {
                elapsed_minutes: 1,
                total_activity_units: 1,
            })
            .is_none()
        );
        assert!(describe(&SimEvent::MoneyChanged { old: 1, new: 2 }).is_none());
    }

    #[test]
    fn attached_narrator_collects_lines() {
        let mut bus = EventBus::new();
        let feed = attach(&mut bus);

        bus.publish(SimEvent::DayChanged {
            day: 2,
            season: Season::Spring,
            crossed: 1,
        });
        bus.publish(SimEvent::AnimalProduced {
            animal_id: ranch_types::AnimalId::new(),
            goods: GoodsType::Milk,
            quality: Quality::Good,
            quantity: 1,
        });

        let lines = feed.borrow();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "+1 good milk");
    }
}
