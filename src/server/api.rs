use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::PlannerConfig;
use crate::data::constants::RaceConstants;
use crate::data::plan::{resolve_plans, PlanInput};
use crate::data::preset::{summaries, Preset, PresetError, PresetStore, PresetSummary};
use crate::data::scenario::RaceScenario;
use crate::data::validate::{validate_scenario, ValidationDiagnostic};
use crate::error::PlannerError;
use crate::optimizer::{plan_strategies, StrategyReport};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("{0}")]
    Planner(#[from] PlannerError),

    #[error("{0}")]
    Preset(#[from] PresetError),

    #[error("failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::Parse(_) | Self::Planner(_) => (400, "Bad Request"),
            Self::Preset(PresetError::NotFound(_)) => (404, "Not Found"),
            Self::Preset(PresetError::BlankName | PresetError::Duplicate(_)) => {
                (400, "Bad Request")
            }
            Self::Preset(_) | Self::Serialize(_) => (500, "Internal Server Error"),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::Serialize)
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(ApiError::Parse)
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "pitwall-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: StrategyReport,
}

/// Body is a [RaceScenario]: constants, plans, optional overrides.
pub fn strategies_payload(body: &str, config: &PlannerConfig) -> Result<String, ApiError> {
    let scenario: RaceScenario = parse(body)?;
    let request = scenario.to_request()?;
    let report = plan_strategies(&request, config)?;
    info!(
        event = "api_strategies",
        returned = report.combinations.len(),
        duration_ms = report.duration_ms,
    );
    to_json(&StrategiesResponse {
        status: "ok",
        report,
    })
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub status: &'static str,
    pub is_valid: bool,
    pub required_minutes: f64,
    pub errors: Vec<ValidationDiagnostic>,
    pub warnings: Vec<ValidationDiagnostic>,
}

pub fn validate_payload(body: &str, config: &PlannerConfig) -> Result<String, ApiError> {
    let scenario: RaceScenario = parse(body)?;
    let plans = resolve_plans(&scenario.plans)?;
    let required_minutes = scenario.required_minutes(&plans)?;
    let report = validate_scenario(
        &scenario.plans,
        &plans,
        &scenario.effective_constants(),
        required_minutes,
        config.catalog_mode,
    );
    to_json(&ValidateResponse {
        status: "ok",
        is_valid: !report.has_errors(),
        required_minutes,
        errors: report.errors().cloned().collect(),
        warnings: report.warnings().cloned().collect(),
    })
}

#[derive(Debug, Serialize)]
struct PresetList {
    presets: Vec<PresetSummary>,
}

pub fn presets_list_payload(store: &dyn PresetStore) -> Result<String, ApiError> {
    to_json(&PresetList {
        presets: summaries(store)?,
    })
}

pub fn preset_get_payload(store: &dyn PresetStore, name: &str) -> Result<String, ApiError> {
    to_json(&store.load(name)?)
}

#[derive(Debug, Deserialize)]
struct NewPreset {
    name: String,
    #[serde(default)]
    constants: RaceConstants,
    #[serde(alias = "savedPlans")]
    plans: Vec<PlanInput>,
    #[serde(default)]
    overwrite: bool,
}

pub fn preset_post_payload(store: &mut dyn PresetStore, body: &str) -> Result<String, ApiError> {
    let input: NewPreset = parse(body)?;
    let preset = Preset::new(&input.name, input.constants, input.plans)?;
    store.save(preset.clone(), input.overwrite)?;
    info!(event = "preset_saved", name = %preset.name);
    to_json(&preset)
}

pub fn preset_delete_payload(store: &mut dyn PresetStore, name: &str) -> Result<String, ApiError> {
    store.delete(name)?;
    info!(event = "preset_deleted", name);
    to_json(&serde_json::json!({ "status": "ok", "deleted": name }))
}
