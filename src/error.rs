//! Error types for the strategy engine.

use thiserror::Error;

/// Input-validation failures reported by the engine. The engine never returns a
/// partial result: it either fails with one of these or returns a complete list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// Required stint time is zero, negative or not a number.
    #[error("invalid requirement: required stint time must be positive, got {0} minutes")]
    InvalidRequirement(f64),

    /// Empty catalog or a plan without a usable duration.
    #[error("invalid plan set: {0}")]
    InvalidPlanSet(String),

    /// Mandatory swaps cannot be placed in the pit opportunities available.
    #[error("infeasible constraints: {swaps} mandatory driver swap(s) but only {pits} pit stop(s)")]
    InfeasibleConstraints { swaps: u32, pits: u32 },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
