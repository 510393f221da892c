//! Save schema versions and the migration chain.
//!
//! Migrations are pure functions over the raw JSON document, kept in an
//! ordered table. A save at version `n` runs every step from `n` up to
//! [`CURRENT_SCHEMA_VERSION`], one at a time, and each step stamps the
//! version it produced.
//!
//! | Version | Layout |
//! |---------|--------|
//! | 1 | `{version, farm: {...}, time_system: {...}}` |
//! | 2 | as 1, without `time_system` |
//! | 3 | farm fields at the top level, collections as arrays |
//! | 4 | minute-based animal timers, `kind`/`species` naming |

use ranch_types::LifeStage;
use serde_json::{Map, Value};

use crate::error::MigrationError;

/// The schema version this build writes.
pub const CURRENT_SCHEMA_VERSION: u64 = 4;

type Step = fn(Value) -> Result<Value, MigrationError>;

/// Entry `i` upgrades version `i + 1` to `i + 2`.
const MIGRATIONS: &[Step] = &[v1_to_v2, v2_to_v3, v3_to_v4];

/// A document brought up to the current schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    /// The upgraded document.
    pub document: Value,
    /// The version it was read at.
    pub from_version: u64,
}

/// The schema version a document declares.
///
/// Reads `schema_version`, then the legacy `version`, and assumes 1 when
/// neither is present.
pub fn schema_version(document: &Value) -> u64 {
    document
        .get("schema_version")
        .or_else(|| document.get("version"))
        .and_then(Value::as_u64)
        .unwrap_or(1)
}

/// Upgrade `document` to [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`MigrationError::FutureVersion`] for a document newer than this
/// build, and [`MigrationError::Malformed`] when a step cannot read its
/// input.
pub fn migrate(mut document: Value) -> Result<Migrated, MigrationError> {
    let from_version = schema_version(&document);
    if from_version > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::FutureVersion {
            found: from_version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    if from_version == 0 {
        return Err(malformed(0, "version 0 was never written"));
    }

    for version in from_version..CURRENT_SCHEMA_VERSION {
        let step = usize::try_from(version.saturating_sub(1))
            .ok()
            .and_then(|index| MIGRATIONS.get(index))
            .ok_or_else(|| malformed(version, "no migration step registered"))?;
        let next = version.saturating_add(1);
        tracing::info!(from = version, to = next, "Migrating save");
        document = stamp(step(document)?, next)?;
    }

    Ok(Migrated {
        document,
        from_version,
    })
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Time used to live in its own section; the farm's counter is now the
/// only clock. Keep whichever of the two counted further.
fn v1_to_v2(document: Value) -> Result<Value, MigrationError> {
    let mut root = object(document, 1, "save root")?;
    let legacy_count = root
        .remove("time_system")
        .and_then(|time| time.get("total_cards_answered").and_then(Value::as_u64))
        .unwrap_or(0);

    let farm = child_object(&mut root, "farm", 1)?;
    let stats = child_object(farm, "statistics", 1)?;
    let current = stats
        .get("total_cards_answered")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    stats.insert(
        "total_cards_answered".to_owned(),
        Value::from(legacy_count.max(current)),
    );

    Ok(Value::Object(root))
}

/// Flatten the envelope and normalise collections.
fn v2_to_v3(document: Value) -> Result<Value, MigrationError> {
    let mut root = object(document, 2, "save root")?;
    let mut farm = match root.remove("farm") {
        Some(farm) => object(farm, 2, "farm")?,
        None => Map::new(),
    };

    let mut out = Map::new();
    for key in ["saved_at", "last_seen_version"] {
        if let Some(value) = root.remove(key) {
            out.insert(key.to_owned(), value);
        }
    }
    out.insert(
        "money".to_owned(),
        farm.remove("money").unwrap_or_else(|| Value::from(0_u64)),
    );

    // Goods and feed shared one namespace only by accident; feed has no
    // quality, so it takes the basic tier.
    let mut inventory = Map::new();
    if let Some(items) = farm
        .get("player")
        .and_then(|player| player.get("inventory"))
        .and_then(Value::as_object)
    {
        for (key, count) in items {
            copy_count(&mut inventory, key.clone(), count)?;
        }
    }
    if let Some(feed) = farm.get("feed_inventory").and_then(Value::as_object) {
        for (key, count) in feed {
            copy_count(&mut inventory, format!("{key}_basic"), count)?;
        }
    }
    out.insert("inventory".to_owned(), Value::Object(inventory));

    let mut stats = match farm.remove("statistics") {
        Some(stats) => object(stats, 2, "statistics")?,
        None => Map::new(),
    };
    stats.remove("days_played");
    for (old, new) in [
        ("total_cards_answered", "total_activity_units"),
        ("animals_raised_by_type", "animals_raised_by_species"),
        ("animals_sold_by_type", "animals_sold_by_species"),
        ("products_sold_by_type", "products_sold_by_goods"),
    ] {
        rename(&mut stats, old, new);
    }
    out.insert("statistics".to_owned(), Value::Object(stats));

    for key in ["animals", "buildings", "decorations"] {
        let list = match farm.remove(key) {
            Some(Value::Object(by_id)) => by_id.into_values().collect(),
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(malformed(2, format!("{key} is neither a map nor a list"))),
        };
        out.insert(key.to_owned(), Value::Array(list));
    }

    Ok(Value::Object(out))
}

/// Hour-based float timers become whole minutes; entity fields take their
/// current names.
fn v3_to_v4(document: Value) -> Result<Value, MigrationError> {
    let mut root = object(document, 3, "save root")?;

    for_each_entry(&mut root, "animals", |animal| {
        rename(animal, "type", "species");
        let age = hours_to_minutes(animal.remove("age_hours").as_ref());
        animal.insert("age_minutes".to_owned(), Value::from(age));
        let timer = hours_to_minutes(animal.remove("hours_since_production").as_ref());
        animal.insert("production_timer_minutes".to_owned(), Value::from(timer));

        let housing = match animal.remove("building_id") {
            Some(Value::String(id)) if !id.is_empty() => Value::String(id),
            _ => Value::Null,
        };
        animal.insert("housing".to_owned(), housing);

        let maturity = animal.get("maturity").and_then(Value::as_f64).unwrap_or(0.0);
        let stage = serde_json::to_value(LifeStage::from_maturity(maturity))
            .map_err(|err| malformed(3, err.to_string()))?;
        animal.insert("last_seen_stage".to_owned(), stage);

        for (field, default) in [("maturity", 0.0), ("health", 1.0), ("hunger", 1.0)] {
            animal.entry(field).or_insert_with(|| Value::from(default));
        }
        animal
            .entry("name")
            .or_insert_with(|| Value::String(String::new()));
        Ok(())
    })?;

    for_each_entry(&mut root, "buildings", |building| {
        rename(building, "type", "kind");
        rename(building, "animals", "housed");
        building.remove("cleanliness");
        building.remove("name");
        building.entry("level").or_insert_with(|| Value::from(1_u8));
        building
            .entry("housed")
            .or_insert_with(|| Value::Array(Vec::new()));
        grid_position(building)
    })?;

    for_each_entry(&mut root, "decorations", |decoration| {
        rename(decoration, "type", "kind");
        // Only the horizontal flip survived; old north/south read as east.
        let facing = match decoration.get("direction").and_then(Value::as_u64) {
            Some(270) => "west",
            _ => "east",
        };
        decoration.insert("direction".to_owned(), Value::from(facing));
        grid_position(decoration)
    })?;

    Ok(Value::Object(root))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn malformed(version: u64, reason: impl Into<String>) -> MigrationError {
    MigrationError::Malformed {
        version,
        reason: reason.into(),
    }
}

fn object(value: Value, version: u64, what: &str) -> Result<Map<String, Value>, MigrationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(malformed(version, format!("{what} is not an object"))),
    }
}

fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    version: u64,
) -> Result<&'a mut Map<String, Value>, MigrationError> {
    parent
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| malformed(version, format!("{key} is not an object")))
}

fn stamp(document: Value, version: u64) -> Result<Value, MigrationError> {
    let mut root = object(document, version, "save root")?;
    root.remove("version");
    root.insert("schema_version".to_owned(), Value::from(version));
    Ok(Value::Object(root))
}

fn rename(map: &mut Map<String, Value>, old: &str, new: &str) {
    if let Some(value) = map.remove(old) {
        map.insert(new.to_owned(), value);
    }
}

fn copy_count(
    inventory: &mut Map<String, Value>,
    key: String,
    count: &Value,
) -> Result<(), MigrationError> {
    let count = count
        .as_u64()
        .ok_or_else(|| malformed(2, format!("inventory count for {key} is not a whole number")))?;
    if count > 0 {
        inventory.insert(key, Value::from(count));
    }
    Ok(())
}

fn for_each_entry<F>(root: &mut Map<String, Value>, key: &str, mut upgrade: F) -> Result<(), MigrationError>
where
    F: FnMut(&mut Map<String, Value>) -> Result<(), MigrationError>,
{
    let Some(entries) = root.get_mut(key).and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for entry in entries {
        let map = entry
            .as_object_mut()
            .ok_or_else(|| malformed(3, format!("{key} entry is not an object")))?;
        upgrade(map)?;
    }
    Ok(())
}

/// `[x, y]` becomes `{x, y}`.
fn grid_position(entity: &mut Map<String, Value>) -> Result<(), MigrationError> {
    let Some(Value::Array(pair)) = entity.get("position") else {
        return Ok(());
    };
    let coordinate = |index: usize| {
        pair.get(index)
            .and_then(Value::as_i64)
            .and_then(|c| i32::try_from(c).ok())
            .ok_or_else(|| malformed(3, "position is not an [x, y] pair"))
    };
    let (x, y) = (coordinate(0)?, coordinate(1)?);
    let mut position = Map::new();
    position.insert("x".to_owned(), Value::from(x));
    position.insert("y".to_owned(), Value::from(y));
    entity.insert("position".to_owned(), Value::Object(position));
    Ok(())
}

/// Float hours to whole minutes, floored. Missing, negative, or non-finite
/// values read as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hours_to_minutes(hours: Option<&Value>) -> u64 {
    let hours = hours.and_then(Value::as_f64).unwrap_or(0.0);
    let minutes = (hours * 60.0).floor();
    if minutes.is_finite() && minutes > 0.0 {
        minutes as u64
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn version_falls_back_from_schema_version_to_version_to_one() {
        assert_eq!(schema_version(&json!({"schema_version": 4, "version": 2})), 4);
        assert_eq!(schema_version(&json!({"version": 2})), 2);
        assert_eq!(schema_version(&json!({"farm": {}})), 1);
    }

    #[test]
    fn one_step_per_version() {
        assert_eq!(
            usize::try_from(CURRENT_SCHEMA_VERSION).unwrap(),
            MIGRATIONS.len() + 1
        );
    }

    #[test]
    fn current_documents_pass_through() {
        let doc = json!({"schema_version": 4, "money": 7});
        let migrated = migrate(doc.clone()).unwrap();
        assert_eq!(migrated.document, doc);
        assert_eq!(migrated.from_version, 4);
    }

    #[test]
    fn newer_documents_are_refused() {
        let err = migrate(json!({"schema_version": 5})).unwrap_err();
        assert_eq!(
            err,
            MigrationError::FutureVersion {
                found: 5,
                supported: 4
            }
        );
    }

    #[test]
    fn version_zero_is_malformed() {
        let err = migrate(json!({"version": 0})).unwrap_err();
        assert!(matches!(err, MigrationError::Malformed { version: 0, .. }));
    }

    #[test]
    fn non_object_root_is_malformed() {
        let err = migrate(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, MigrationError::Malformed { version: 1, .. }));
    }

    #[test]
    fn legacy_time_section_keeps_the_higher_count() {
        let ahead = v1_to_v2(json!({
            "time_system": {"total_cards_answered": 90},
            "farm": {"statistics": {"total_cards_answered": 40}}
        }))
        .unwrap();
        assert_eq!(ahead["farm"]["statistics"]["total_cards_answered"], 90);
        assert!(ahead.get("time_system").is_none());

        let behind = v1_to_v2(json!({
            "time_system": {"total_cards_answered": 10},
            "farm": {"statistics": {"total_cards_answered": 40}}
        }))
        .unwrap();
        assert_eq!(behind["farm"]["statistics"]["total_cards_answered"], 40);
    }

    #[test]
    fn feed_joins_the_inventory_at_basic_quality() {
        let doc = v2_to_v3(json!({
            "farm": {
                "money": 300,
                "player": {"inventory": {"egg_good": 2, "milk_basic": 0}},
                "feed_inventory": {"cow_feed": 12}
            }
        }))
        .unwrap();
        assert_eq!(doc["money"], 300);
        assert_eq!(doc["inventory"], json!({"egg_good": 2, "cow_feed_basic": 12}));
        assert_eq!(doc["animals"], json!([]));
    }

    #[test]
    fn fractional_inventory_counts_are_malformed() {
        let err = v2_to_v3(json!({"farm": {"feed_inventory": {"pig_feed": 1.5}}})).unwrap_err();
        assert!(matches!(err, MigrationError::Malformed { version: 2, .. }));
    }

    #[test]
    fn animal_timers_become_minutes() {
        let doc = v3_to_v4(json!({
            "animals": [{
                "id": "0192f0c4-0000-7000-8000-000000000001",
                "type": "pig",
                "age_hours": 1.999,
                "hours_since_production": 0.5,
                "maturity": 0.4,
                "building_id": ""
            }]
        }))
        .unwrap();
        let pig = &doc["animals"][0];
        assert_eq!(pig["species"], "pig");
        assert_eq!(pig["age_minutes"], 119);
        assert_eq!(pig["production_timer_minutes"], 30);
        assert_eq!(pig["housing"], Value::Null);
        assert_eq!(pig["last_seen_stage"], "teen");
        assert_eq!(pig["health"], 1.0);
    }

    #[test]
    fn decorations_face_east_unless_west() {
        let doc = v3_to_v4(json!({
            "decorations": [
                {"type": "bench", "position": [1, 2], "direction": 180},
                {"type": "bench", "position": [3, 4], "direction": 270}
            ]
        }))
        .unwrap();
        assert_eq!(doc["decorations"][0]["direction"], "east");
        assert_eq!(doc["decorations"][0]["position"], json!({"x": 1, "y": 2}));
        assert_eq!(doc["decorations"][1]["direction"], "west");
    }

    fn version_two_save() -> Value {
        json!({
            "version": 2,
            "saved_at": "2024-03-01T12:00:00Z",
            "farm": {
                "money": 640,
                "player": {"inventory": {"egg_premium": 3}},
                "feed_inventory": {"chicken_feed": 20},
                "statistics": {"total_cards_answered": 75, "days_played": 4},
                "animals": {
                    "0192f0c4-0000-7000-8000-000000000001": {
                        "id": "0192f0c4-0000-7000-8000-000000000001",
                        "type": "chicken",
                        "age_hours": 30.25,
                        "hours_since_production": 1.5,
                        "maturity": 1.0,
                        "health": 0.9,
                        "building_id": "0192f0c4-0000-7000-8000-0000000000aa"
                    }
                },
                "buildings": {
                    "0192f0c4-0000-7000-8000-0000000000aa": {
                        "id": "0192f0c4-0000-7000-8000-0000000000aa",
                        "type": "coop",
                        "level": 2,
                        "position": [5, 1],
                        "cleanliness": 0.4,
                        "animals": ["0192f0c4-0000-7000-8000-000000000001"]
                    }
                },
                "decorations": {}
            }
        })
    }

    #[test]
    fn chain_matches_the_steps_applied_by_hand() {
        let by_hand = stamp(v2_to_v3(version_two_save()).unwrap(), 3).unwrap();
        let by_hand = stamp(v3_to_v4(by_hand).unwrap(), 4).unwrap();

        let Migrated {
            document,
            from_version,
        } = migrate(version_two_save()).unwrap();

        assert_eq!(from_version, 2);
        assert_eq!(document, by_hand);
        assert_eq!(document["schema_version"], CURRENT_SCHEMA_VERSION);
        assert_eq!(document["statistics"]["total_activity_units"], 75);
        assert_eq!(document["animals"][0]["age_minutes"], 1815);
        assert_eq!(document["buildings"][0]["housed"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn negative_hours_read_as_zero() {
        assert_eq!(hours_to_minutes(Some(&json!(-3.0))), 0);
        assert_eq!(hours_to_minutes(None), 0);
        assert_eq!(hours_to_minutes(Some(&json!(2.5))), 150);
    }
}
