//! Compute module - The search engine and the domains it runs on.

pub mod domains;
pub mod evolution;

pub use evolution::{
    Candidate, NovelArchive, NoveltySearcher, Population, SearchError, Solution, SolutionFactory,
};
