//! Endurance race stint and driver-swap strategy planner.
//!
//! Given a race length, pit costs, a mandatory swap count and a catalog of
//! stint plans, [optimizer::plan_strategies] enumerates the stint mixes that
//! cover the race, places the driver swaps, ranks and deduplicates them.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod optimizer;
pub mod parallel;
pub mod server;

pub use config::PlannerConfig;
pub use data::constants::RaceConstants;
pub use data::plan::StintPlan;
pub use error::{PlannerError, Result};
pub use optimizer::combination::Combination;
pub use optimizer::enumerator::enumerate_combinations;
pub use optimizer::swap_placement::optimize_swap_placement;
pub use optimizer::{plan_strategies, StrategyReport, StrategyRequest};
