//! Errors raised by the search engine.

use crate::schema::OptionsError;

fn population_label(feasible: &bool) -> &'static str {
    if *feasible { "feasible" } else { "infeasible" }
}

/// Search failures. All of them abort the current run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// More neighbours requested than the population and archive hold.
    #[error("Novelty needs {k} neighbours but only {available} are available")]
    NotEnoughNeighbours { k: usize, available: usize },
    /// The domain does not implement an optional operator.
    #[error("Operation not supported by this domain: {0}")]
    UnsupportedOperation(&'static str),
    /// `advance_generation` called on a population with no individuals.
    #[error("Cannot advance an empty {} population", population_label(.feasible))]
    EmptyPopulation { feasible: bool },
    /// Selection cannot fill the population back to its target size.
    #[error("Selection has {available} candidates but needs {target}")]
    PopulationUnderfilled { available: usize, target: usize },
    /// A candidate was inserted into the wrong population.
    #[error("Candidate {id} does not belong in the {} population", population_label(.expected_feasible))]
    Misclassified { id: u64, expected_feasible: bool },
    /// The factory could not fill both populations within the attempt budget.
    #[error(
        "Seeding gave up after {attempts} attempts with {feasible} feasible and {infeasible} infeasible individuals"
    )]
    SeedingTimeout {
        attempts: usize,
        feasible: usize,
        infeasible: usize,
    },
    /// A previous generation failed and the searcher stopped.
    #[error("Search halted after a failed generation (completed {generation})")]
    Halted { generation: usize },
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),
    #[error("Archive export failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
