//! Constrained dual-population novelty search.
//!
//! Candidates live in one of two populations: a feasible population selected
//! for novelty and an infeasible population selected for closeness to the
//! feasible region. Children whose feasibility flips are handed to the other
//! population, and the most novel feasible individuals are promoted to a
//! permanent archive that every later novelty score is measured against.
//!
//! # Overview
//!
//! - **Solution contract** (`solution`): what a domain must implement
//! - **Populations** (`population`): the per-generation advance step
//! - **Archive** (`archive`): append-only record of novel feasible candidates
//! - **Searcher** (`search`): seeding, bootstrap, and migration between populations
//!
//! # Example
//!
//! ```rust,no_run
//! use novelty_search::compute::domains::{ScalarFactory, ScalarSolution};
//! use novelty_search::compute::evolution::NoveltySearcher;
//! use novelty_search::schema::{ScalarDomain, SearchConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = SearchConfig::default();
//! let factory = ScalarFactory::new(&ScalarDomain::default());
//! let mut searcher: NoveltySearcher<ScalarSolution> =
//!     NoveltySearcher::seed(&config, &factory, StdRng::seed_from_u64(42))?;
//!
//! let summary = searcher.run_with_callback(config.generations, |report| {
//!     println!("Generation {}: archive size = {}", report.generation, report.archive_size);
//! })?;
//! println!("Archived {} candidates", summary.archive_size);
//! # Ok::<(), novelty_search::compute::evolution::SearchError>(())
//! ```

mod archive;
mod error;
mod population;
mod search;
mod solution;

pub use archive::{ArchivedExport, NovelArchive, load_exports};
pub use error::SearchError;
pub use population::{GenerationOutcome, Population};
pub use search::NoveltySearcher;
pub use solution::{Candidate, Solution, SolutionFactory};
