//! The interactive loop's state: one session, its save manager, and the
//! autosave policy.
//!
//! Command handling is synchronous and writes to any [`Write`], so the
//! whole loop body can be driven from tests without a terminal.

use std::io::Write;

use ranch_core::config::PersistenceConfig;
use ranch_core::{BoundaryKind, Session, SessionError, TickSummary};
use ranch_store::SaveManager;
use ranch_types::{FeedType, GridPosition, Species};
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP};
use crate::error::EngineError;
use crate::narrator::{self, Feed};

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// The farm has been saved; stop.
    Quit,
}

/// A running farm attached to its save directory.
#[derive(Debug)]
pub struct Shell {
    session: Session,
    store: SaveManager,
    narration: Feed,
    autosave_every_units: u64,
    autosave_on_day_change: bool,
    counter_at_last_save: u64,
}

impl Shell {
    /// Wrap `session`, narrating its events and saving through `store`.
    pub fn new(mut session: Session, store: SaveManager, persistence: &PersistenceConfig) -> Self {
        let narration = narrator::attach(session.bus_mut());
        let counter_at_last_save = session.counter();
        Self {
            session,
            store,
            narration,
            autosave_every_units: persistence.autosave_every_units,
            autosave_on_day_change: persistence.autosave_on_day_change,
            counter_at_last_save,
        }
    }

    /// The running session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command, writing player output to `out`.
    ///
    /// Refused shop and market operations are reported to `out`, not
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if `out` fails, [`EngineError::Store`]
    /// if an explicit or final save fails, and [`EngineError::Session`] for
    /// failures other than a refused trade.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow, EngineError> {
        match command {
            Command::Activity(units) => {
                let summary = self.session.on_activity(units)?;
                self.after_tick(&summary, out)?;
            }
            Command::Skip(hours) => {
                let summary = self.session.skip_hours(hours)?;
                writeln!(out, "Skipped {hours}h to {}", summary.time)?;
                self.after_tick(&summary, out)?;
            }
            Command::Status => self.status(out)?,
            Command::Build(species) => {
                let kind = species.housing();
                let column = i32::try_from(self.session.farm().buildings.len()).unwrap_or(i32::MAX);
                let built = self
                    .session
                    .purchase_building(kind, GridPosition::new(column, 0));
                if refused(built, out)?.is_some() {
                    writeln!(out, "Built a {kind}")?;
                }
            }
            Command::Buy(species) => self.buy(species, out)?,
            Command::Feed(species, units) => {
                let bought = self
                    .session
                    .purchase_feed(FeedType::for_species(species), units);
                if let Some(price) = refused(bought, out)? {
                    writeln!(out, "Bought {units} {species} feed for {price}")?;
                }
            }
            Command::Sell => {
                if let Some(revenue) = refused(self.session.sell_all_goods(), out)? {
                    writeln!(out, "Earned {revenue}")?;
                }
            }
            Command::Save => {
                self.save()?;
                writeln!(out, "Saved")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {
                self.save()?;
                writeln!(out, "Saved. Goodbye!")?;
                return Ok(Flow::Quit);
            }
        }
        self.flush_narration(out)?;
        Ok(Flow::Continue)
    }

    /// Write the farm to disk now.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the write fails.
    pub fn save(&mut self) -> Result<(), EngineError> {
        self.store.save(self.session.farm())?;
        self.counter_at_last_save = self.session.counter();
        Ok(())
    }

    fn after_tick<W: Write>(&mut self, summary: &TickSummary, out: &mut W) -> Result<(), EngineError> {
        if summary.paused {
            writeln!(out, "(paused)")?;
            return Ok(());
        }
        if summary.handler_failures > 0 {
            warn!(
                failures = summary.handler_failures,
                "Subscribers failed during tick"
            );
        }

        let since_save = summary.counter.saturating_sub(self.counter_at_last_save);
        let by_count = self.autosave_every_units > 0 && since_save >= self.autosave_every_units;
        let by_day = self.autosave_on_day_change && summary.crossed(BoundaryKind::Day);
        if by_count || by_day {
            debug!(by_count, by_day, counter = summary.counter, "Autosaving");
            // A failed autosave is retried on the next trigger.
            if let Err(err) = self.save() {
                warn!(error = %err, "Autosave failed");
            }
        }
        Ok(())
    }

    fn buy<W: Write>(&mut self, species: Species, out: &mut W) -> Result<(), EngineError> {
        let home = self
            .session
            .farm()
            .buildings
            .values()
            .find(|building| building.accepts(species) && building.has_room())
            .map(|building| building.id);
        let Some(home) = home else {
            writeln!(
                out,
                "No {} with room; try `build {species}`",
                species.housing()
            )?;
            return Ok(());
        };
        if refused(self.session.purchase_animal(species, home), out)?.is_some() {
            writeln!(out, "Bought a {species}")?;
        }
        Ok(())
    }

    fn status<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let farm = self.session.farm();
        writeln!(
            out,
            "{} | activity {}",
            self.session.now(),
            self.session.counter()
        )?;
        writeln!(
            out,
            "Money {} | goods worth {}",
            farm.money,
            self.session.inventory_value()
        )?;
        for species in Species::ALL {
            let count = farm.count_species(species);
            if count > 0 {
                writeln!(out, "  {species}: {count}")?;
            }
        }
        for (key, count) in farm.inventory.iter() {
            writeln!(out, "  {key}: {count}")?;
        }
        Ok(())
    }

    fn flush_narration<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let lines = std::mem::take(&mut *self.narration.borrow_mut());
        for line in lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

/// Unwrap a session result, printing a refused trade instead of failing.
fn refused<T, W: Write>(result: Result<T, SessionError>, out: &mut W) -> Result<Option<T>, EngineError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SessionError::Economy { source }) => {
            info!(reason = %source, "Trade refused");
            writeln!(out, "Refused: {source}")?;
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ranch_core::SimulationConfig;
    use tempfile::TempDir;

    use super::*;

    fn shell(dir: &TempDir, every: u64, on_day: bool) -> Shell {
        let config = SimulationConfig::default();
        let persistence = PersistenceConfig {
            save_dir: dir.path().to_path_buf(),
            autosave_every_units: every,
            autosave_on_day_change: on_day,
        };
        let session = Session::new(&config).unwrap();
        Shell::new(session, SaveManager::local(dir.path()), &persistence)
    }

    fn run(shell: &mut Shell, line: &str) -> String {
        let mut out = Vec::new();
        shell.execute(line.parse().unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn build_buy_feed_and_grow() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, false);

        assert!(run(&mut shell, "build chicken").contains("Built a coop"));
        assert!(run(&mut shell, "buy chicken").contains("Bought a chicken"));
        assert!(run(&mut shell, "feed chicken 100").contains("Bought 100 chicken feed"));

        let out = run(&mut shell, "a 1500");
        assert!(out.contains("A chicken is now an adult"), "{out}");
        assert_eq!(shell.session().farm().count_species(Species::Chicken), 1);
    }

    #[test]
    fn buying_without_housing_explains_itself() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, false);

        let out = run(&mut shell, "buy cow");
        assert!(out.contains("No barn with room"), "{out}");
        assert_eq!(shell.session().farm().count_species(Species::Cow), 0);
    }

    #[test]
    fn refused_trades_are_printed_not_raised() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, false);

        let out = run(&mut shell, "sell");
        assert!(out.starts_with("Refused:"), "{out}");
    }

    #[test]
    fn autosave_after_enough_units() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 10, false);
        let store = SaveManager::local(dir.path());

        run(&mut shell, "a 9");
        assert!(!store.has_save());
        run(&mut shell, "a");
        assert!(store.has_save());
        assert_eq!(
            store.load().unwrap().farm.statistics.total_activity_units,
            10
        );
    }

    #[test]
    fn autosave_on_new_day() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, true);
        let store = SaveManager::local(dir.path());

        run(&mut shell, "skip 1");
        assert!(!store.has_save());
        run(&mut shell, "skip 24");
        assert!(store.has_save());
    }

    #[test]
    fn quit_saves_and_stops() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, false);
        run(&mut shell, "a 5");

        let mut out = Vec::new();
        let flow = shell.execute(Command::Quit, &mut out).unwrap();

        assert_eq!(flow, Flow::Quit);
        let saved = SaveManager::local(dir.path()).load().unwrap();
        assert_eq!(saved.farm.statistics.total_activity_units, 5);
    }

    #[test]
    fn status_lists_money_and_goods() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir, 0, false);
        run(&mut shell, "build pig");
        run(&mut shell, "feed pig 50");

        let out = run(&mut shell, "status");
        assert!(out.contains("Spring Day 1, Year 1 06:00"), "{out}");
        assert!(out.contains("pig_feed_basic: 50"), "{out}");
    }
}
