use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use pitwall::data::constants::RaceConstants;
use pitwall::data::plan::{default_catalog, PlanInput};
use pitwall::data::preset::{
    export_json, import_json, JsonDirPresetStore, MemoryPresetStore, Preset, PresetError,
    PresetStore,
};
use pitwall::optimizer::plan_strategies;
use pitwall::PlannerConfig;

fn unique_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("pitwall-{name}-{stamp}"))
}

fn preset(name: &str, hours: f64) -> Preset {
    let constants = RaceConstants {
        race_time_hours: hours,
        ..RaceConstants::default()
    };
    let plans = default_catalog().iter().map(PlanInput::from).collect();
    Preset::new(name, constants, plans).expect("valid preset")
}

#[test]
fn directory_store_round_trips_presets() {
    let dir = unique_dir("store");
    let mut store = JsonDirPresetStore::new(&dir);
    assert!(store.list_names().expect("missing dir lists empty").is_empty());

    store.save(preset("Spa", 6.0), false).expect("save");
    store.save(preset("Daytona", 24.0), false).expect("save");
    assert_eq!(
        store.list_names().expect("list"),
        vec!["Daytona".to_string(), "Spa".to_string()]
    );

    let loaded = store.load("Daytona").expect("load");
    assert_eq!(loaded.constants.race_time_hours, 24.0);
    assert!(store.exists("Spa").expect("exists"));

    store.delete("Spa").expect("delete");
    assert!(matches!(store.load("Spa"), Err(PresetError::NotFound(_))));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn directory_store_rejects_duplicates_and_tolerates_junk_files() {
    let dir = unique_dir("junk");
    let mut store = JsonDirPresetStore::new(&dir);
    store.save(preset("Spa", 6.0), false).expect("save");
    assert!(matches!(
        store.save(preset("Spa", 8.0), false),
        Err(PresetError::Duplicate(_))
    ));

    fs::write(dir.join("broken.json"), "{ nope").expect("write junk");
    fs::write(dir.join("notes.txt"), "ignored").expect("write junk");
    assert_eq!(store.list_names().expect("list"), vec!["Spa".to_string()]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn names_that_differ_only_in_punctuation_keep_separate_files() {
    let dir = unique_dir("collide");
    let mut store = JsonDirPresetStore::new(&dir);
    store.save(preset("Le Mans", 24.0), true).expect("save");
    store.save(preset("Le_Mans", 6.0), true).expect("save");

    assert_eq!(
        store.list_names().expect("list"),
        vec!["Le Mans".to_string(), "Le_Mans".to_string()]
    );
    assert_eq!(store.load("Le Mans").expect("load").constants.race_time_hours, 24.0);
    assert_eq!(store.load("Le_Mans").expect("load").constants.race_time_hours, 6.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn merge_import_into_files_keeps_every_preset() {
    let mut memory = MemoryPresetStore::new();
    memory.save(preset("Le Mans", 24.0), false).expect("save");
    memory.save(preset("Le_Mans", 6.0), false).expect("save");
    let exported = export_json(&memory).expect("export");

    let dir = unique_dir("merge");
    let mut files = JsonDirPresetStore::new(&dir);
    assert_eq!(import_json(&mut files, &exported, true).expect("import"), 2);
    assert_eq!(files.list_names().expect("list").len(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn export_from_files_imports_into_memory() {
    let dir = unique_dir("export");
    let mut files = JsonDirPresetStore::new(&dir);
    files.save(preset("Spa", 6.0), false).expect("save");
    files.save(preset("Le Mans", 24.0), false).expect("save");

    let exported = export_json(&files).expect("export");
    let mut memory = MemoryPresetStore::new();
    assert_eq!(import_json(&mut memory, &exported, false).expect("import"), 2);
    assert_eq!(
        memory.load("Le Mans").expect("load"),
        files.load("Le Mans").expect("load")
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn saved_preset_drives_the_planner() {
    let mut store = MemoryPresetStore::new();
    store.save(preset("Eight", 8.0), false).expect("save");
    let request = store
        .load("Eight")
        .expect("load")
        .to_scenario()
        .to_request()
        .expect("preset resolves");
    let report = plan_strategies(&request, &PlannerConfig::default()).expect("plan");
    assert!(!report.combinations.is_empty());
}
