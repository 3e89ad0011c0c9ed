pub mod auto_adjust;
pub mod combination;
pub mod enumerator;
pub mod ranking;
pub mod swap_placement;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PlannerConfig;
use crate::data::constants::RaceConstants;
use crate::data::plan::StintPlan;
use crate::error::Result;
use crate::optimizer::auto_adjust::auto_adjusted_combinations;
use crate::optimizer::combination::Combination;
use crate::optimizer::enumerator::Enumerator;
use crate::optimizer::ranking::{dedup_combinations, rank_combinations};
use crate::optimizer::swap_placement::SwapOptimizer;
use crate::parallel::WorkerPool;

/// Everything the engine needs for one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub plans: Vec<StintPlan>,
    pub required_minutes: f64,
    pub mandatory_swaps: u32,
    /// When present, regular pit cost feeds the search estimate and every
    /// result gets a race clock estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<RaceConstants>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub required_minutes: f64,
    pub mandatory_swaps: u32,
    pub enumerated: usize,
    pub auto_adjusted: usize,
    pub variants: usize,
    /// Rows left after dedup, before the result cap.
    pub distinct: usize,
    pub duration_ms: u64,
    pub combinations: Vec<Combination>,
}

/// Enumerate, auto-adjust, place swaps, rank, dedup and cap.
pub fn plan_strategies(request: &StrategyRequest, config: &PlannerConfig) -> Result<StrategyReport> {
    let started = Instant::now();
    let limits = config.effective_limits();
    let swaps = request.mandatory_swaps;
    info!(
        event = "plan_start",
        plans = request.plans.len(),
        required_minutes = request.required_minutes,
        mandatory_swaps = swaps,
        mode = ?config.catalog_mode,
    );

    let enumerator = Enumerator::new(limits)
        .with_mode(config.catalog_mode)
        .with_pit_estimate(request.constants.map_or(0.0, |c| c.pit_minutes()));
    let enumerated = if config.parallel_workers > 0 {
        enumerator.enumerate_parallel(
            &request.plans,
            request.required_minutes,
            swaps,
            &WorkerPool::with_workers(config.parallel_workers),
        )?
    } else {
        enumerator.enumerate(&request.plans, request.required_minutes, swaps)?
    };

    let auto = if config.include_auto_adjusted {
        auto_adjusted_combinations(&request.plans, request.required_minutes, swaps, &limits)?
    } else {
        Vec::new()
    };
    let enumerated_count = enumerated.len();
    let auto_count = auto.len();

    let optimizer = SwapOptimizer::new(config.max_swap_variants);
    let mut variants = Vec::with_capacity(enumerated_count + auto_count);
    for combination in auto.iter().chain(&enumerated) {
        for variant in optimizer.optimize(combination, swaps)? {
            variants.push(match request.constants {
                Some(constants) => variant.with_race_estimate(&constants),
                None => variant,
            });
        }
    }
    let variant_count = variants.len();

    let mut ranked = dedup_combinations(rank_combinations(variants), config.dedup);
    let distinct = ranked.len();
    ranked.truncate(config.effective_result_cap());

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        event = "plan_end",
        enumerated = enumerated_count,
        auto_adjusted = auto_count,
        variants = variant_count,
        distinct,
        returned = ranked.len(),
        duration_ms,
    );

    Ok(StrategyReport {
        required_minutes: request.required_minutes,
        mandatory_swaps: swaps,
        enumerated: enumerated_count,
        auto_adjusted: auto_count,
        variants: variant_count,
        distinct,
        duration_ms,
        combinations: ranked,
    })
}
