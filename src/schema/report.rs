//! Per-generation and end-of-run reporting types.

use serde::{Deserialize, Serialize};

/// What happened during one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation number, starting at 1.
    pub generation: usize,
    /// Feasible population size after its own selection, before migrants arrive.
    pub feasible_size: usize,
    /// Infeasible population size after its own selection, before migrants arrive.
    pub infeasible_size: usize,
    /// Archive size at the end of the generation.
    pub archive_size: usize,
    /// Individuals promoted to the archive this generation.
    pub archived: usize,
    /// Feasible children that turned out infeasible.
    pub feasible_to_infeasible: usize,
    /// Infeasible children that turned out feasible.
    pub infeasible_to_feasible: usize,
    /// Highest novelty in the feasible population.
    pub best_novelty: f64,
    /// Mean novelty of the feasible population.
    pub mean_novelty: f64,
    /// Smallest distance to feasibility in the infeasible population.
    pub best_distance_to_feasibility: Option<f64>,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Requested generation count reached.
    MaxGenerations,
    /// Cancelled between generations.
    Cancelled,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    /// Generations completed.
    pub generations: usize,
    /// Stop reason.
    pub stop_reason: StopReason,
    /// Final archive size.
    pub archive_size: usize,
    /// Total feasible-to-infeasible migrations.
    pub feasible_to_infeasible: usize,
    /// Total infeasible-to-feasible migrations.
    pub infeasible_to_feasible: usize,
    /// Wall-clock time of the run.
    pub elapsed_seconds: f64,
}
