//! The solution contract implemented by every search domain, and the
//! engine-side [`Candidate`] wrapper that carries a solution through the run.

use rand::Rng;

use crate::schema::NoveltySearchOptions;

use super::{NovelArchive, Population, SearchError};

/// A candidate solution in a constrained search space.
///
/// Implementors own the genome; the engine only sees the operations below.
/// Solutions are values: variation operators return new solutions and never
/// alter `self`, and feasibility must be a pure function of the genome.
pub trait Solution: Clone + Send + Sync {
    /// Produce a mutated copy.
    ///
    /// Domains read `options.mutation_chance` and `options.mutation_strength`.
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, options: &NoveltySearchOptions) -> Self;

    /// Produce a child from `self` and `other`.
    ///
    /// Domains that cannot recombine keep this default, which fails with
    /// [`SearchError::UnsupportedOperation`].
    fn recombine<R: Rng + ?Sized>(
        &self,
        _other: &Self,
        _rng: &mut R,
        _options: &NoveltySearchOptions,
    ) -> Result<Self, SearchError> {
        Err(SearchError::UnsupportedOperation("recombine"))
    }

    /// Constraint violation severity. Zero or less means feasible.
    ///
    /// This may be expensive; [`Candidate`] evaluates it once.
    fn distance_to_feasibility(&self) -> f64;

    /// Whether the solution satisfies the domain's constraints.
    fn is_feasible(&self) -> bool {
        self.distance_to_feasibility() <= 0.0
    }

    /// Distance used for novelty.
    fn novelty_distance(&self, other: &Self) -> f64;

    /// Mean distance to the `k` nearest of `neighbours`.
    ///
    /// Distances are stably sorted, so equal distances keep the order in
    /// which the neighbours were supplied.
    fn calculate_novelty<'a, I>(&self, neighbours: I, k: usize) -> Result<f64, SearchError>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        if k == 0 {
            return Err(crate::schema::OptionsError::NoNeighbours.into());
        }

        let mut distances: Vec<f64> = neighbours
            .into_iter()
            .map(|n| self.novelty_distance(n))
            .collect();

        if distances.len() < k {
            return Err(SearchError::NotEnoughNeighbours {
                k,
                available: distances.len(),
            });
        }

        distances.sort_by(|a, b| a.total_cmp(b));
        Ok(distances[..k].iter().sum::<f64>() / k as f64)
    }
}

/// Produces initial solutions for seeding a search.
pub trait SolutionFactory<S: Solution> {
    /// Draw a random solution. It may be feasible or not.
    fn random_solution<R: Rng + ?Sized>(&self, rng: &mut R) -> S;

    /// Perturb a feasible solution outside its valid range.
    ///
    /// Used when random draws rarely produce infeasible individuals.
    fn make_infeasible<R: Rng + ?Sized>(&self, _feasible: &S, _rng: &mut R) -> Option<S> {
        None
    }
}

/// A solution tracked by the engine.
#[derive(Debug, Clone)]
pub struct Candidate<S> {
    /// Unique identifier within a run.
    pub id: u64,
    /// The domain solution.
    pub solution: S,
    /// Novelty from the generation this candidate was last scored in.
    pub novelty: f64,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
    distance_to_feasibility: f64,
}

impl<S: Solution> Candidate<S> {
    /// Wrap a solution, evaluating its feasibility once.
    pub fn new(id: u64, solution: S, generation: usize, parents: Vec<u64>) -> Self {
        let distance_to_feasibility = solution.distance_to_feasibility();
        Self {
            id,
            solution,
            novelty: 0.0,
            generation,
            parents,
            distance_to_feasibility,
        }
    }

    /// Cached distance to feasibility.
    pub fn distance_to_feasibility(&self) -> f64 {
        self.distance_to_feasibility
    }

    /// Cached feasibility.
    pub fn is_feasible(&self) -> bool {
        self.distance_to_feasibility <= 0.0
    }

    /// Novelty against `population` (excluding this candidate) followed by the archive.
    pub fn calculate_novelty(
        &self,
        population: &Population<S>,
        archive: &NovelArchive<S>,
        k: usize,
    ) -> Result<f64, SearchError> {
        let neighbours = population
            .current_generation()
            .iter()
            .filter(|c| c.id != self.id)
            .chain(archive.iter())
            .map(|c| &c.solution);

        self.solution.calculate_novelty(neighbours, k)
    }

    /// Copy under a new id, keeping genome, novelty and lineage.
    pub(crate) fn copy_with_id(&self, id: u64) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}
