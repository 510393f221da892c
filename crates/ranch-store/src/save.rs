//! Save-file management: atomic writes, one rolling backup, and migrated
//! loads.
//!
//! # Layout
//!
//! ```text
//! <save dir>/
//!     ranch_save.json          <- current save
//!     ranch_save_backup.json   <- the save before that
//! ```
//!
//! A save is written to a temp file in the same directory, flushed to disk,
//! and renamed over the primary. The previous primary is copied to the
//! backup first, so a crash at any point leaves at least one complete file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ranch_types::Farm;
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::migrate::{self, CURRENT_SCHEMA_VERSION, Migrated};
use crate::sync::{CloudSync, NoopSync};

/// File name of the current save.
pub const SAVE_FILE: &str = "ranch_save.json";

/// File name of the rolling backup.
pub const BACKUP_FILE: &str = "ranch_save_backup.json";

/// Starting balance of a farm created because no save was usable.
pub const DEFAULT_INITIAL_MONEY: u64 = 1500;

/// The on-disk document: version metadata plus the flattened farm.
#[derive(Serialize)]
struct Envelope<'a> {
    schema_version: u64,
    saved_at: DateTime<Utc>,
    #[serde(flatten)]
    farm: &'a Farm,
}

/// Where a loaded farm came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSource {
    /// The current save file.
    Primary,
    /// The primary was missing or damaged; the backup was used.
    Backup,
    /// Neither file was usable; this is a brand-new farm.
    Fresh,
}

/// Result of [`SaveManager::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    /// Which file, if any, supplied the farm.
    pub source: SaveSource,
    /// Schema version the file was migrated from, if it was old.
    pub migrated_from: Option<u64>,
    /// The loaded farm.
    pub farm: Farm,
}

/// Result of a successful [`SaveManager::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Where the save landed.
    pub path: PathBuf,
    /// Timestamp written into the file.
    pub saved_at: DateTime<Utc>,
    /// Size of the written document.
    pub bytes: usize,
    /// Whether a previous save was rotated into the backup slot.
    pub backed_up: bool,
}

/// A summary of the primary save, read without migrating or loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveInfo {
    /// Schema version declared by the file.
    pub schema_version: u64,
    /// When it was written, if the timestamp is readable.
    pub saved_at: Option<DateTime<Utc>>,
    /// Balance.
    pub money: u64,
    /// Number of animals.
    pub animal_count: usize,
    /// Number of buildings.
    pub building_count: usize,
}

/// Owns the save directory for one farm.
pub struct SaveManager {
    dir: PathBuf,
    sync: Box<dyn CloudSync>,
    initial_money: u64,
}

impl std::fmt::Debug for SaveManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveManager")
            .field("dir", &self.dir)
            .field("initial_money", &self.initial_money)
            .finish_non_exhaustive()
    }
}

impl SaveManager {
    /// A manager for saves in `dir`, pushing each save to `sync`.
    ///
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>, sync: Box<dyn CloudSync>) -> Self {
        Self {
            dir: dir.into(),
            sync,
            initial_money: DEFAULT_INITIAL_MONEY,
        }
    }

    /// A manager with no cloud sync.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Box::new(NoopSync))
    }

    /// Set the balance of the farm created when no save is usable.
    #[must_use]
    pub const fn with_initial_money(mut self, money: u64) -> Self {
        self.initial_money = money;
        self
    }

    /// Path of the current save.
    pub fn save_path(&self) -> PathBuf {
        self.dir.join(SAVE_FILE)
    }

    /// Path of the backup.
    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    /// Whether a primary save exists.
    pub fn has_save(&self) -> bool {
        self.save_path().is_file()
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Write `farm` durably, rotating the previous save into the backup.
    ///
    /// The cloud sync is told afterwards; its failure is logged and does not
    /// fail the save.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory, temp file, flush, or
    /// rename fails, and [`StoreError::Serialization`] if the farm cannot be
    /// encoded. On error the previous primary is untouched.
    pub fn save(&self, farm: &Farm) -> Result<SaveReceipt, StoreError> {
        let saved_at = Utc::now();
        let document = serde_json::to_value(Envelope {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at,
            farm,
        })?;
        let bytes = serde_json::to_vec_pretty(&document)?;

        fs::create_dir_all(&self.dir).map_err(|err| StoreError::io(&self.dir, err))?;
        let mut staged = self.temp_file()?;
        staged
            .write_all(&bytes)
            .map_err(|err| StoreError::io(staged.path(), err))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|err| StoreError::io(staged.path(), err))?;

        let primary = self.save_path();
        let backed_up = primary.is_file();
        if backed_up {
            self.rotate_backup(&primary)?;
        }
        staged
            .persist(&primary)
            .map_err(|err| StoreError::io(&primary, err.error))?;

        tracing::info!(
            path = %primary.display(),
            bytes = bytes.len(),
            animals = farm.animals.len(),
            activity_units = farm.statistics.total_activity_units,
            "Farm saved"
        );

        if let Err(err) = self.sync.push(&document) {
            tracing::warn!(error = %err, "Cloud sync push failed");
        }

        Ok(SaveReceipt {
            path: primary,
            saved_at,
            bytes: bytes.len(),
            backed_up,
        })
    }

    /// Copy the current primary into the backup slot via temp + rename.
    fn rotate_backup(&self, primary: &Path) -> Result<(), StoreError> {
        let mut source = File::open(primary).map_err(|err| StoreError::io(primary, err))?;
        let mut staged = self.temp_file()?;
        io::copy(&mut source, &mut staged).map_err(|err| StoreError::io(staged.path(), err))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|err| StoreError::io(staged.path(), err))?;
        let backup = self.backup_path();
        staged
            .persist(&backup)
            .map_err(|err| StoreError::io(&backup, err.error))?;
        Ok(())
    }

    fn temp_file(&self) -> Result<NamedTempFile, StoreError> {
        NamedTempFile::new_in(&self.dir).map_err(|err| StoreError::io(&self.dir, err))
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Load the farm: primary first, then backup, then a fresh farm.
    ///
    /// Missing, unparseable, or undecodable files are skipped with a
    /// warning. Old schema versions are migrated in memory; the file itself
    /// is rewritten on the next save.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] when a file is newer than this
    /// build or cannot be migrated. That is never papered over with the
    /// backup, since doing so would silently roll the player back.
    pub fn load(&self) -> Result<LoadOutcome, StoreError> {
        for (source, path) in [
            (SaveSource::Primary, self.save_path()),
            (SaveSource::Backup, self.backup_path()),
        ] {
            match read_save(&path) {
                Ok(Some((farm, migrated_from))) => {
                    tracing::info!(
                        path = %path.display(),
                        ?source,
                        ?migrated_from,
                        animals = farm.animals.len(),
                        "Farm loaded"
                    );
                    return Ok(LoadOutcome {
                        source,
                        migrated_from,
                        farm,
                    });
                }
                Ok(None) => tracing::debug!(path = %path.display(), "No save file"),
                Err(err @ StoreError::Migration(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Unusable save file");
                }
            }
        }

        tracing::warn!(
            dir = %self.dir.display(),
            money = self.initial_money,
            "No usable save, starting a fresh farm"
        );
        Ok(LoadOutcome {
            source: SaveSource::Fresh,
            migrated_from: None,
            farm: Farm::new(self.initial_money),
        })
    }

    /// Remove both the primary and the backup. Missing files are fine.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if a file exists but cannot be removed.
    pub fn delete(&self) -> Result<(), StoreError> {
        for path in [self.save_path(), self.backup_path()] {
            match fs::remove_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "Save file deleted"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(StoreError::io(&path, err)),
            }
        }
        Ok(())
    }

    /// Peek at the primary save without loading it. `None` if there is no
    /// readable primary.
    pub fn info(&self) -> Option<SaveInfo> {
        let text = fs::read_to_string(self.save_path()).ok()?;
        let document: Value = serde_json::from_str(&text).ok()?;
        // Versions before 3 nest the farm under its own key.
        let farm = document.get("farm").unwrap_or(&document);

        Some(SaveInfo {
            schema_version: migrate::schema_version(&document),
            saved_at: document
                .get("saved_at")
                .and_then(Value::as_str)
                .and_then(|stamp| stamp.parse().ok()),
            money: farm.get("money").and_then(Value::as_u64).unwrap_or(0),
            animal_count: collection_len(farm.get("animals")),
            building_count: collection_len(farm.get("buildings")),
        })
    }
}

/// Read, migrate, and decode one save file. `Ok(None)` when it does not
/// exist.
fn read_save(path: &Path) -> Result<Option<(Farm, Option<u64>)>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::io(path, err)),
    };
    let document: Value = serde_json::from_str(&text)?;
    if !document.is_object() {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: "top level is not an object".to_owned(),
        });
    }

    let Migrated {
        document,
        from_version,
    } = migrate::migrate(document)?;
    let farm: Farm = serde_json::from_value(document)?;
    let migrated_from = (from_version < CURRENT_SCHEMA_VERSION).then_some(from_version);
    Ok(Some((farm, migrated_from)))
}

/// Entity count whether the collection is an array or an id-keyed map.
fn collection_len(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(by_id)) => by_id.len(),
        _ => 0,
    }
}
