//! Novelty search - Constrained dual-population novelty search.
//!
//! This crate evolves candidate solutions under constraints by coevolving two
//! populations: one of feasible solutions selected for novelty, and one of
//! infeasible solutions selected for closeness to the feasible region.
//! Children whose classification differs from their parent population migrate
//! to the other side, and the most novel feasible children feed an
//! append-only archive.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Options, run configuration, domain selection and reports
//! - `compute`: The search engine and the reference domains it runs on
//!
//! # Example
//!
//! ```rust,no_run
//! use novelty_search::{
//!     compute::domains::{ScalarFactory, ScalarSolution},
//!     compute::NoveltySearcher,
//!     schema::{ScalarDomain, SearchConfig},
//! };
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = SearchConfig::default();
//! let factory = ScalarFactory::new(&ScalarDomain::default());
//! let rng = StdRng::seed_from_u64(42);
//!
//! let mut searcher: NoveltySearcher<ScalarSolution> =
//!     NoveltySearcher::seed(&config, &factory, rng).unwrap();
//! let summary = searcher.run(100).unwrap();
//!
//! println!("Archived {} novel solutions", summary.archive_size);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    Candidate, NovelArchive, NoveltySearcher, Population, SearchError, Solution, SolutionFactory,
};
pub use schema::{NoveltySearchOptions, RunConfig, SearchConfig};
