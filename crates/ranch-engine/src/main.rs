//! Ranch simulation binary.
//!
//! Reads activity from stdin, one line per command, and drives a single
//! farm with it. Each line is turned into activity units, a shop action, or
//! a save. The farm is autosaved on a unit cadence and at day boundaries,
//! and again on `quit`, end of input, or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ranch-config.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Build the save manager, with HTTP sync if enabled
//! 4. Load the farm (primary, backup, or fresh)
//! 5. Start the session and attach the narrator
//! 6. Run the command loop
//! 7. Save, give the last cloud push a bounded grace period, and exit

mod commands;
mod error;
mod http_sync;
mod narrator;
mod shell;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use ranch_core::config::{LogFormat, LoggingConfig};
use ranch_core::{Session, SimulationConfig};
use ranch_store::{CloudSync, NoopSync, SaveManager, SaveSource};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::Command;
use crate::error::EngineError;
use crate::http_sync::{HttpSync, InFlight};
use crate::shell::{Flow, Shell};

/// Default config file, relative to the working directory.
const CONFIG_FILE: &str = "ranch-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, loading, or the final save fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        save_dir = %config.persistence.save_dir.display(),
        minutes_per_unit = config.calendar.minutes_per_unit,
        sync_enabled = config.sync.enabled,
        "ranch-engine starting"
    );

    // 3. Build the save manager.
    let (sync, in_flight): (Box<dyn CloudSync>, InFlight) = if config.sync.enabled {
        info!(endpoint = config.sync.endpoint, "Cloud sync enabled");
        let http = HttpSync::new(&config.sync)?;
        let in_flight = http.in_flight();
        (Box::new(http), in_flight)
    } else {
        (Box::new(NoopSync), InFlight::default())
    };
    let store = SaveManager::new(&config.persistence.save_dir, sync)
        .with_initial_money(config.economy.initial_money);

    // 4. Load the farm.
    let loaded = store.load()?;
    if loaded.source == SaveSource::Backup {
        warn!("Primary save was unusable, resumed from backup");
    }

    // 5. Start the session.
    let session = Session::with_farm(&config, loaded.farm)?;
    let mut shell = Shell::new(session, store, &config.persistence);
    println!("{} (type `help` for commands)", shell.session().now());

    // 6. Run the command loop.
    run(&mut shell).await?;

    // 7. The final save queued a push; let it land before the runtime goes.
    let unsynced = in_flight
        .settle(Duration::from_millis(config.sync.timeout_ms))
        .await;

    info!(
        activity_units = shell.session().counter(),
        unsynced,
        "ranch-engine shutdown complete"
    );
    Ok(())
}

/// Read commands until `quit`, end of input, or Ctrl-C.
async fn run(shell: &mut Shell) -> Result<(), EngineError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            // Out of input: save before leaving.
            shell.save()?;
            return Ok(());
        };

        match line.parse::<Command>() {
            Ok(command) => {
                if shell.execute(command, &mut out)? == Flow::Quit {
                    return Ok(());
                }
            }
            Err(err) => writeln!(out, "{err}")?,
        }
        out.flush()?;
    }
}

/// Load the simulation configuration.
///
/// Uses the path given as the first argument, else `ranch-config.yaml` in
/// the working directory, else built-in defaults (with environment
/// overrides still applied).
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level. Logs go to stderr so stdout stays for the farm.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
