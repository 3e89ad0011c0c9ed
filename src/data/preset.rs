//! Named race setups: constants plus the plan catalog, saved under a name.
//!
//! [PresetStore] is the load / save / delete / list seam. Two stores ship: an
//! in-memory map for tests and the HTTP server's fallback, and a directory of
//! JSON files, one per preset.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::data::constants::RaceConstants;
use crate::data::plan::PlanInput;
use crate::data::scenario::RaceScenario;

pub const DEFAULT_PRESETS_DIR: &str = "data/presets";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("preset name cannot be empty")]
    BlankName,

    #[error("a preset named '{0}' already exists")]
    Duplicate(String),

    #[error("preset '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetMetadata {
    pub total_plans: usize,
    pub plan_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub constants: RaceConstants,
    #[serde(alias = "savedPlans")]
    pub plans: Vec<PlanInput>,
    #[serde(default)]
    pub metadata: PresetMetadata,
}

impl Preset {
    /// New preset with a fresh id and timestamp. The name is trimmed and must
    /// not be blank.
    pub fn new(
        name: &str,
        constants: RaceConstants,
        plans: Vec<PlanInput>,
    ) -> Result<Self, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::BlankName);
        }
        let metadata = PresetMetadata {
            total_plans: plans.len(),
            plan_names: plans.iter().map(|plan| plan.name.clone()).collect(),
        };
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339(),
            constants,
            plans,
            metadata,
        })
    }

    /// Copy under another name with a new id and timestamp.
    pub fn renamed(&self, name: &str) -> Result<Self, PresetError> {
        Self::new(name, self.constants, self.plans.clone())
    }

    /// One-line description, e.g. `8h race · 3 plans · pit 52s · swap 210s`.
    pub fn summary(&self) -> String {
        format!(
            "{}h race · {} plans · pit {}s · swap {}s",
            self.constants.race_time_hours,
            self.plans.len(),
            self.constants.pit_time_seconds,
            (self.constants.swap_pit_minutes() * 60.0).round(),
        )
    }

    pub fn to_scenario(&self) -> RaceScenario {
        RaceScenario {
            constants: self.constants,
            plans: self.plans.clone(),
            required_minutes: None,
            mandatory_swaps: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetSummary {
    pub name: String,
    pub summary: String,
    pub created_at: String,
}

pub trait PresetStore {
    /// Names in ascending order.
    fn list_names(&self) -> Result<Vec<String>, PresetError>;

    fn load(&self, name: &str) -> Result<Preset, PresetError>;

    /// Fails with [PresetError::Duplicate] when the name is taken and
    /// `overwrite` is false.
    fn save(&mut self, preset: Preset, overwrite: bool) -> Result<(), PresetError>;

    fn delete(&mut self, name: &str) -> Result<(), PresetError>;

    fn exists(&self, name: &str) -> Result<bool, PresetError> {
        Ok(self.list_names()?.iter().any(|existing| existing == name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPresetStore {
    presets: BTreeMap<String, Preset>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for MemoryPresetStore {
    fn list_names(&self) -> Result<Vec<String>, PresetError> {
        Ok(self.presets.keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<Preset, PresetError> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    fn save(&mut self, preset: Preset, overwrite: bool) -> Result<(), PresetError> {
        if preset.name.trim().is_empty() {
            return Err(PresetError::BlankName);
        }
        if !overwrite && self.presets.contains_key(&preset.name) {
            return Err(PresetError::Duplicate(preset.name));
        }
        self.presets.insert(preset.name.clone(), preset);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), PresetError> {
        self.presets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }
}

/// One `<escaped name>.json` file per preset under a directory, created on first
/// write.
#[derive(Debug, Clone)]
pub struct JsonDirPresetStore {
    dir: PathBuf,
}

impl JsonDirPresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(name)))
    }

    fn read_all(&self) -> Result<Vec<Preset>, PresetError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut presets = Vec::new();
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(PresetError::from)
                .and_then(|raw| serde_json::from_str::<Preset>(&raw).map_err(PresetError::from));
            match parsed {
                Ok(preset) => presets.push(preset),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable preset"),
            }
        }
        Ok(presets)
    }
}

impl PresetStore for JsonDirPresetStore {
    fn list_names(&self) -> Result<Vec<String>, PresetError> {
        let mut names: Vec<String> = self.read_all()?.into_iter().map(|p| p.name).collect();
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<Preset, PresetError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        let preset: Preset = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if preset.name != name {
            return Err(PresetError::NotFound(name.to_string()));
        }
        Ok(preset)
    }

    fn save(&mut self, preset: Preset, overwrite: bool) -> Result<(), PresetError> {
        if preset.name.trim().is_empty() {
            return Err(PresetError::BlankName);
        }
        let path = self.path_for(&preset.name);
        if path.exists() {
            if !overwrite {
                return Err(PresetError::Duplicate(preset.name));
            }
            // case-insensitive filesystems can still fold two names together
            let stored = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<Preset>(&raw).ok());
            if stored.is_some_and(|stored| stored.name != preset.name) {
                return Err(PresetError::Duplicate(preset.name));
            }
        }
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(&preset)?)?;
        debug!(name = %preset.name, path = %path.display(), "preset saved");
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), PresetError> {
        // load first so a case-folded collision cannot delete another preset
        self.load(name)?;
        fs::remove_file(self.path_for(name))?;
        Ok(())
    }
}

/// Injective file stem: ASCII letters, digits and `-` stay, every other byte
/// becomes `_` plus two hex digits, so no name can reach outside the
/// directory or land on another name's file.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

pub fn summaries(store: &dyn PresetStore) -> Result<Vec<PresetSummary>, PresetError> {
    store
        .list_names()?
        .into_iter()
        .map(|name| {
            let preset = store.load(&name)?;
            Ok(PresetSummary {
                summary: preset.summary(),
                created_at: preset.created_at,
                name,
            })
        })
        .collect()
}

/// Every preset as one pretty JSON object keyed by name.
pub fn export_json(store: &dyn PresetStore) -> Result<String, PresetError> {
    let mut all = BTreeMap::new();
    for name in store.list_names()? {
        let preset = store.load(&name)?;
        all.insert(name, preset);
    }
    Ok(serde_json::to_string_pretty(&all)?)
}

/// Load an [export_json] document. Without `merge` the store is emptied
/// first; with it, imported presets replace same-named ones. Returns the
/// number of presets imported.
pub fn import_json(
    store: &mut dyn PresetStore,
    json: &str,
    merge: bool,
) -> Result<usize, PresetError> {
    let imported: BTreeMap<String, Preset> = serde_json::from_str(json)?;
    if !merge {
        for name in store.list_names()? {
            store.delete(&name)?;
        }
    }
    let count = imported.len();
    for (name, mut preset) in imported {
        preset.name = name;
        store.save(preset, true)?;
    }
    Ok(count)
}
