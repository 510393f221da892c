//! Save and load against a real directory.
//!
//! Each test gets its own scratch directory from `tempfile`, so the
//! rotation and fallback paths run over actual files and renames.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::fs;
use std::sync::{Arc, Mutex};

use ranch_store::{
    CURRENT_SCHEMA_VERSION, CloudSync, MigrationError, SaveManager, SaveSource, StoreError,
    SyncError,
};
use ranch_types::{
    Animal, Building, BuildingKind, Decoration, DecorationId, DecorationKind, Direction, FeedType,
    Farm, GoodsType, GridPosition, InventoryKey, LifeStage, Quality, Species,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn sample_farm(money: u64) -> Farm {
    let mut farm = Farm::new(money);
    let mut coop = Building::new(BuildingKind::Coop, GridPosition::new(4, 1));
    let mut hen = Animal::newborn(Species::Chicken, "Clucky", Some(coop.id));
    hen.age_minutes = 1_234;
    hen.maturity = 0.82;
    hen.health = 0.76;
    hen.hunger = 0.5;
    hen.last_seen_stage = LifeStage::Adult;
    hen.production_timer_minutes = 42;
    coop.housed.insert(hen.id);
    farm.animals.insert(hen.id, hen);
    farm.buildings.insert(coop.id, coop);

    let well = Decoration {
        id: DecorationId::new(),
        kind: DecorationKind::WaterWell,
        position: GridPosition::new(-2, 5),
        direction: Direction::West,
    };
    farm.decorations.insert(well.id, well);

    farm.inventory
        .add(InventoryKey::new(GoodsType::Egg, Quality::Premium), 3);
    farm.inventory.add(InventoryKey::feed(FeedType::ChickenFeed), 70);
    farm.statistics.total_activity_units = 9_001;
    farm.statistics.record_raised(Species::Chicken);
    farm
}

#[derive(Clone, Default)]
struct RecordingSync {
    pushed: Arc<Mutex<Vec<Value>>>,
}

impl CloudSync for RecordingSync {
    fn push(&self, document: &Value) -> Result<(), SyncError> {
        self.pushed.lock().unwrap().push(document.clone());
        Ok(())
    }
}

struct BrokenSync;

impl CloudSync for BrokenSync {
    fn push(&self, _document: &Value) -> Result<(), SyncError> {
        Err(SyncError::Rejected { status: 503 })
    }
}

// =============================================================================
// Round trip and rotation
// =============================================================================

#[test]
fn saved_farm_loads_back_identical() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    let farm = sample_farm(1_500);

    let receipt = store.save(&farm).unwrap();
    assert_eq!(receipt.path, dir.path().join("ranch_save.json"));
    assert!(!receipt.backed_up);
    assert!(receipt.bytes > 0);

    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Primary);
    assert_eq!(outcome.migrated_from, None);
    assert_eq!(outcome.farm, farm);
}

#[test]
fn file_carries_version_and_no_time_section() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(10)).unwrap();

    let text = fs::read_to_string(store.save_path()).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["schema_version"], CURRENT_SCHEMA_VERSION);
    assert!(doc["saved_at"].is_string());
    assert_eq!(doc["money"], 10);
    assert_eq!(doc["inventory"]["egg_premium"], 3);
    assert_eq!(doc["inventory"]["chicken_feed_basic"], 70);
    assert_eq!(doc["statistics"]["total_activity_units"], 9_001);
    assert!(doc.get("time").is_none());
    assert!(doc.get("farm").is_none());
}

#[test]
fn second_save_rotates_the_first_into_backup() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(100)).unwrap();

    let receipt = store.save(&sample_farm(200)).unwrap();
    assert!(receipt.backed_up);

    let backup: Value =
        serde_json::from_str(&fs::read_to_string(store.backup_path()).unwrap()).unwrap();
    assert_eq!(backup["money"], 100);
    assert_eq!(store.load().unwrap().farm.money, 200);
}

#[test]
fn no_temp_files_are_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(1)).unwrap();
    store.save(&sample_farm(2)).unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["ranch_save.json", "ranch_save_backup.json"]);
}

#[test]
fn save_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("profiles").join("alex");
    let store = SaveManager::local(&nested);

    store.save(&sample_farm(5)).unwrap();
    assert!(nested.join("ranch_save.json").is_file());
}

// =============================================================================
// Fallbacks
// =============================================================================

#[test]
fn damaged_primary_falls_back_to_backup() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(100)).unwrap();
    store.save(&sample_farm(200)).unwrap();
    fs::write(store.save_path(), "{\"money\": 200, \"animals\": [").unwrap();

    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Backup);
    assert_eq!(outcome.farm.money, 100);
}

#[test]
fn undecodable_primary_falls_back_to_backup() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(100)).unwrap();
    store.save(&sample_farm(200)).unwrap();
    fs::write(
        store.save_path(),
        r#"{"schema_version": 4, "money": "lots", "animals": [], "buildings": [], "decorations": []}"#,
    )
    .unwrap();

    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Backup);
    assert_eq!(outcome.farm.money, 100);
}

#[test]
fn nothing_usable_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path()).with_initial_money(750);

    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Fresh);
    assert_eq!(outcome.farm, Farm::new(750));

    fs::write(store.save_path(), "not json").unwrap();
    fs::write(store.backup_path(), "[]").unwrap();
    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Fresh);
    assert_eq!(outcome.farm.money, 750);
}

#[test]
fn future_version_is_fatal_even_with_a_good_backup() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(100)).unwrap();
    store.save(&sample_farm(200)).unwrap();
    fs::write(store.save_path(), r#"{"schema_version": 99, "money": 5}"#).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        StoreError::Migration(MigrationError::FutureVersion {
            found: 99,
            supported: 4
        })
    ));
}

// =============================================================================
// Migration
// =============================================================================

const HEN_ID: &str = "6f1c2a9e-3b44-4d1a-9a51-0d2b7c3e8f10";
const COOP_ID: &str = "0b8e1f52-77c1-4e0b-8d1e-5a0c9b2f6d31";

fn legacy_v1() -> Value {
    json!({
        "version": 1,
        "saved_at": "2024-03-09T18:22:05.123456",
        "time_system": {"total_cards_answered": 250, "current_minute": 17},
        "farm": {
            "id": "c6b3a2d1-0000-4000-8000-000000000000",
            "name": "Sunny Acres",
            "owner_id": "",
            "money": 640,
            "unlocked_zones": 1,
            "player": {"inventory": {"egg_premium": 3, "milk_good": 0}},
            "animals": {
                HEN_ID: {
                    "id": HEN_ID,
                    "type": "chicken",
                    "name": "Pecky",
                    "age_hours": 30.5,
                    "maturity": 1.0,
                    "health": 0.9,
                    "hunger": 0.8,
                    "building_id": COOP_ID,
                    "hours_since_production": 2.25
                }
            },
            "buildings": {
                COOP_ID: {
                    "id": COOP_ID,
                    "type": "coop",
                    "level": 2,
                    "position": [3, 4],
                    "animals": [HEN_ID],
                    "cleanliness": 1.0,
                    "name": ""
                }
            },
            "decorations": {
                "3d9a7c55-1e2f-4a6b-8c0d-9e8f7a6b5c4d": {
                    "id": "3d9a7c55-1e2f-4a6b-8c0d-9e8f7a6b5c4d",
                    "type": "scarecrow",
                    "position": [0, 7],
                    "direction": 180
                }
            },
            "products": {},
            "feed_inventory": {"chicken_feed": 40},
            "statistics": {
                "total_money_earned": 900,
                "total_animals_raised": 1,
                "total_animals_sold": 0,
                "total_products_sold": 12,
                "total_cards_answered": 120,
                "highest_money_held": 1500,
                "days_played": 3,
                "animals_raised_by_type": {"chicken": 1},
                "animals_sold_by_type": {},
                "products_sold_by_type": {"egg": 12}
            }
        }
    })
}

#[test]
fn version_one_save_migrates_to_current() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    fs::write(store.save_path(), legacy_v1().to_string()).unwrap();

    let outcome = store.load().unwrap();
    assert_eq!(outcome.source, SaveSource::Primary);
    assert_eq!(outcome.migrated_from, Some(1));

    let farm = outcome.farm;
    assert_eq!(farm.money, 640);
    // The detached time section counted further than the farm did.
    assert_eq!(farm.statistics.total_activity_units, 250);
    assert_eq!(farm.statistics.total_products_sold, 12);
    assert_eq!(farm.statistics.products_sold_by_goods[&GoodsType::Egg], 12);
    assert_eq!(farm.statistics.animals_raised_by_species[&Species::Chicken], 1);

    let hen = farm.animals.values().next().unwrap();
    assert_eq!(hen.id.to_string(), HEN_ID);
    assert_eq!(hen.species, Species::Chicken);
    assert_eq!(hen.name, "Pecky");
    assert_eq!(hen.age_minutes, 1_830);
    assert_eq!(hen.production_timer_minutes, 135);
    assert_eq!(hen.last_seen_stage, LifeStage::Adult);
    assert_eq!(hen.housing.unwrap().to_string(), COOP_ID);

    let coop = farm.buildings.values().next().unwrap();
    assert_eq!(coop.kind, BuildingKind::Coop);
    assert_eq!(coop.level, 2);
    assert_eq!(coop.position, GridPosition::new(3, 4));
    assert!(coop.housed.contains(&hen.id));

    let scarecrow = farm.decorations.values().next().unwrap();
    assert_eq!(scarecrow.kind, DecorationKind::Scarecrow);
    assert_eq!(scarecrow.direction, Direction::East);

    assert_eq!(
        farm.inventory
            .count(InventoryKey::new(GoodsType::Egg, Quality::Premium)),
        3
    );
    assert_eq!(
        farm.inventory.count(InventoryKey::feed(FeedType::ChickenFeed)),
        40
    );
    assert_eq!(farm.inventory.total_units(), 43);
}

#[test]
fn version_two_save_skips_the_first_step() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    let mut doc = legacy_v1();
    doc["version"] = json!(2);
    doc.as_object_mut().unwrap().remove("time_system");
    fs::write(store.save_path(), doc.to_string()).unwrap();

    let outcome = store.load().unwrap();
    assert_eq!(outcome.migrated_from, Some(2));
    assert_eq!(outcome.farm.statistics.total_activity_units, 120);
}

#[test]
fn migrated_farm_is_written_at_current_version_on_next_save() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    fs::write(store.save_path(), legacy_v1().to_string()).unwrap();

    let farm = store.load().unwrap().farm;
    store.save(&farm).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.migrated_from, None);
    assert_eq!(reloaded.farm, farm);
    assert_eq!(store.info().unwrap().schema_version, CURRENT_SCHEMA_VERSION);
}

// =============================================================================
// Housekeeping and sync
// =============================================================================

#[test]
fn delete_removes_both_files() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    store.save(&sample_farm(1)).unwrap();
    store.save(&sample_farm(2)).unwrap();
    assert!(store.has_save());

    store.delete().unwrap();
    assert!(!store.has_save());
    assert!(!store.backup_path().exists());
    assert_eq!(store.load().unwrap().source, SaveSource::Fresh);

    // Deleting nothing is not an error.
    store.delete().unwrap();
}

#[test]
fn info_summarises_without_loading() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    assert!(store.info().is_none());

    let receipt = store.save(&sample_farm(321)).unwrap();
    let info = store.info().unwrap();
    assert_eq!(info.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(info.saved_at, Some(receipt.saved_at));
    assert_eq!(info.money, 321);
    assert_eq!(info.animal_count, 1);
    assert_eq!(info.building_count, 1);
}

#[test]
fn info_reads_legacy_layout() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::local(dir.path());
    fs::write(store.save_path(), legacy_v1().to_string()).unwrap();

    let info = store.info().unwrap();
    assert_eq!(info.schema_version, 1);
    assert_eq!(info.saved_at, None);
    assert_eq!(info.money, 640);
    assert_eq!(info.animal_count, 1);
}

#[test]
fn each_committed_save_is_pushed() {
    let dir = TempDir::new().unwrap();
    let sync = RecordingSync::default();
    let store = SaveManager::new(dir.path(), Box::new(sync.clone()));

    store.save(&sample_farm(11)).unwrap();
    store.save(&sample_farm(12)).unwrap();

    let pushed = sync.pushed.lock().unwrap();
    assert_eq!(pushed.len(), 2);
    assert_eq!(pushed[1]["money"], 12);
    assert_eq!(pushed[1]["schema_version"], CURRENT_SCHEMA_VERSION);
}

#[test]
fn sync_failure_does_not_fail_the_save() {
    let dir = TempDir::new().unwrap();
    let store = SaveManager::new(dir.path(), Box::new(BrokenSync));

    store.save(&sample_farm(8)).unwrap();
    assert_eq!(store.load().unwrap().farm.money, 8);
}
