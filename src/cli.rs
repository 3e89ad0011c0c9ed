use std::env;
use std::io;

use serde::Serialize;

use crate::config::{PlannerConfig, DEFAULT_CONFIG_PATH};
use crate::data::plan::resolve_plans;
use crate::data::preset::{
    export_json, import_json, summaries, JsonDirPresetStore, Preset, PresetStore,
    DEFAULT_PRESETS_DIR,
};
use crate::data::scenario::RaceScenario;
use crate::data::validate::validate_scenario;
use crate::optimizer::combination::Combination;
use crate::optimizer::plan_strategies;
use crate::server;

const USAGE: &str = "usage: pitwall <plan|validate|serve|presets>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Plan,
    Validate,
    Serve,
    Presets,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("plan") => Some(Command::Plan),
        Some("validate") => Some(Command::Validate),
        Some("serve") => Some(Command::Serve),
        Some("presets") => Some(Command::Presets),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Plan) => handle_plan(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Serve) => handle_serve(args),
        Some(Command::Presets) => handle_presets(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// `--config PATH` when given (must load), otherwise `pitwall.toml` if it
/// exists, otherwise defaults.
fn load_config(args: &[String]) -> Result<PlannerConfig, String> {
    match flag_value(args, "--config") {
        Some(path) => {
            PlannerConfig::load(path).map_err(|err| format!("failed to load config '{path}': {err}"))
        }
        None => Ok(PlannerConfig::load(DEFAULT_CONFIG_PATH).unwrap_or_default()),
    }
}

fn preset_store() -> JsonDirPresetStore {
    JsonDirPresetStore::new(
        env::var("PITWALL_PRESETS").unwrap_or_else(|_| DEFAULT_PRESETS_DIR.to_string()),
    )
}

fn handle_serve(args: &[String]) -> i32 {
    let config = match load_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let bind_addr = env::var("PITWALL_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let mut store = preset_store();
    match server::run_server(&bind_addr, &mut store, &config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_plan(args: &[String]) -> i32 {
    let Some(path) = positional(args, 2) else {
        eprintln!("usage: pitwall plan <scenario.json|scenario.yaml> [--csv] [--config PATH]");
        return 2;
    };
    let config = match load_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let scenario = match RaceScenario::load(path) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("failed to read scenario '{path}': {err}");
            return 1;
        }
    };

    let report = match scenario
        .to_request()
        .and_then(|request| plan_strategies(&request, &config))
    {
        Ok(report) => report,
        Err(err) => {
            eprintln!("planning failed: {err}");
            return 1;
        }
    };

    if has_flag(args, "--csv") {
        return match write_csv(&report.combinations, io::stdout().lock()) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("failed to write csv: {err}");
                1
            }
        };
    }

    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize strategy report: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = positional(args, 2) else {
        eprintln!("usage: pitwall validate <scenario.json|scenario.yaml> [--config PATH]");
        return 2;
    };
    let config = match load_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let scenario = match RaceScenario::load(path) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("failed to read scenario '{path}': {err}");
            return 1;
        }
    };

    let checked = resolve_plans(&scenario.plans).and_then(|plans| {
        let required = scenario.required_minutes(&plans)?;
        Ok(validate_scenario(
            &scenario.plans,
            &plans,
            &scenario.effective_constants(),
            required,
            config.catalog_mode,
        ))
    });
    let report = match checked {
        Ok(report) => report,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    for warning in report.warnings() {
        eprintln!("- {warning}");
    }
    if report.has_errors() {
        let errors: Vec<_> = report.errors().collect();
        eprintln!("validation failed: {} issue(s)", errors.len());
        for issue in errors {
            eprintln!("- {issue}");
        }
        return 1;
    }
    println!("validation passed: {path}");
    0
}

fn handle_presets(args: &[String]) -> i32 {
    let mut store = preset_store();
    let result = match positional(args, 2) {
        Some("list") => summaries(&store).map(|rows| {
            for row in rows {
                println!("{}\t{}", row.name, row.summary);
            }
        }),
        Some("show") => {
            let Some(name) = positional(args, 3) else {
                eprintln!("usage: pitwall presets show <name>");
                return 2;
            };
            store.load(name).and_then(|preset| {
                println!("{}", serde_json::to_string_pretty(&preset)?);
                Ok(())
            })
        }
        Some("delete") => {
            let Some(name) = positional(args, 3) else {
                eprintln!("usage: pitwall presets delete <name>");
                return 2;
            };
            store
                .delete(name)
                .map(|()| println!("deleted preset '{name}'"))
        }
        Some("save") => {
            let (Some(name), Some(path)) = (positional(args, 3), positional(args, 4)) else {
                eprintln!("usage: pitwall presets save <name> <scenario> [--overwrite]");
                return 2;
            };
            let scenario = match RaceScenario::load(path) {
                Ok(scenario) => scenario,
                Err(err) => {
                    eprintln!("failed to read scenario '{path}': {err}");
                    return 1;
                }
            };
            Preset::new(name, scenario.effective_constants(), scenario.plans)
                .and_then(|preset| store.save(preset, has_flag(args, "--overwrite")))
                .map(|()| println!("saved preset '{}'", name.trim()))
        }
        Some("export") => export_json(&store).map(|payload| println!("{payload}")),
        Some("import") => {
            let Some(path) = positional(args, 3) else {
                eprintln!("usage: pitwall presets import <file.json> [--merge]");
                return 2;
            };
            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(err) => {
                    eprintln!("failed to read '{path}': {err}");
                    return 1;
                }
            };
            import_json(&mut store, &raw, has_flag(args, "--merge"))
                .map(|count| println!("imported {count} preset(s)"))
        }
        _ => {
            eprintln!("usage: pitwall presets <list|show|delete|save|export|import>");
            return 2;
        }
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("preset command failed: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    id: &'a str,
    strategy: String,
    total_stints: u32,
    total_stint_time: u32,
    over_time: f64,
    efficiency: f64,
    total_pits: u32,
    regular_pits: u32,
    driver_swap_pits: u32,
    swap_placement: String,
    swap_score: Option<f64>,
    auto_adjusted: bool,
    total_race_time: Option<f64>,
}

/// Ranked combinations as CSV, one row per combination, header first.
pub fn write_csv<W: io::Write>(combinations: &[Combination], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for (index, combination) in combinations.iter().enumerate() {
        writer.serialize(CsvRow {
            rank: index + 1,
            id: &combination.id,
            strategy: combination.label(),
            total_stints: combination.total_stints,
            total_stint_time: combination.total_stint_time,
            over_time: combination.over_time,
            efficiency: combination.efficiency,
            total_pits: combination.total_pits,
            regular_pits: combination.regular_pits,
            driver_swap_pits: combination.driver_swap_pits,
            swap_placement: combination
                .swap_placement
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            swap_score: combination.swap_optimization_score,
            auto_adjusted: combination.is_auto_adjusted,
            total_race_time: combination.race_estimate.map(|e| e.total_race_time),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

/// The `n`th argument once `--flag` switches and `--config`'s value are
/// skipped.
fn positional(args: &[String], n: usize) -> Option<&str> {
    let mut plain = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--config" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        plain.push(arg.as_str());
    }
    plain.get(n).copied()
}
