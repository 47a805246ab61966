//! Feasible and infeasible populations and the per-generation advance step.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rayon::prelude::*;

use crate::schema::NoveltySearchOptions;

use super::{Candidate, NovelArchive, SearchError, Solution};

/// Counts and migrants produced by one [`Population::advance_generation`] call.
#[derive(Debug)]
pub struct GenerationOutcome<S> {
    /// Children whose feasibility disagrees with the population.
    pub returned: Vec<Candidate<S>>,
    /// Children spawned.
    pub spawned: usize,
    /// Individuals moved into the archive.
    pub archived: usize,
    /// Individuals kept as the next generation.
    pub retained: usize,
    /// Individuals dropped by selection.
    pub discarded: usize,
}

/// A set of candidates that all share one feasibility classification.
#[derive(Debug)]
pub struct Population<S> {
    is_feasible: bool,
    target_size: usize,
    current_generation: Vec<Candidate<S>>,
    generation: usize,
    next_id: Arc<AtomicU64>,
}

impl<S: Solution> Population<S> {
    /// Create an empty population.
    pub fn new(is_feasible: bool, target_size: usize) -> Self {
        Self {
            is_feasible,
            target_size,
            current_generation: Vec::with_capacity(target_size),
            generation: 0,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Share an id counter, so candidates stay unique across populations.
    pub fn with_id_source(mut self, next_id: Arc<AtomicU64>) -> Self {
        self.next_id = next_id;
        self
    }

    /// Build a population from initial solutions.
    ///
    /// Fails if any solution's feasibility disagrees with `is_feasible`.
    pub fn from_solutions<I>(
        is_feasible: bool,
        target_size: usize,
        solutions: I,
    ) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
    {
        let mut population = Self::new(is_feasible, target_size);
        for solution in solutions {
            population.add_solution(solution)?;
        }
        Ok(population)
    }

    /// Whether this is the feasible population.
    pub fn is_feasible(&self) -> bool {
        self.is_feasible
    }

    /// Size the population is trimmed back to every generation.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Candidates in the current generation.
    pub fn current_generation(&self) -> &[Candidate<S>] {
        &self.current_generation
    }

    pub(crate) fn current_generation_mut(&mut self) -> &mut [Candidate<S>] {
        &mut self.current_generation
    }

    /// Number of current candidates.
    pub fn len(&self) -> usize {
        self.current_generation.len()
    }

    /// Whether there are no current candidates.
    pub fn is_empty(&self) -> bool {
        self.current_generation.is_empty()
    }

    /// Generations advanced so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub(crate) fn id_source(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.next_id)
    }

    pub(crate) fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Wrap and add an initial solution, returning its id.
    pub fn add_solution(&mut self, solution: S) -> Result<u64, SearchError> {
        let candidate = Candidate::new(self.allocate_id(), solution, self.generation, Vec::new());
        let id = candidate.id;
        self.insert(candidate)?;
        Ok(id)
    }

    /// Add an existing candidate, typically a migrant from the partner population.
    ///
    /// The population may exceed its target size until the next advance.
    pub fn insert(&mut self, candidate: Candidate<S>) -> Result<(), SearchError> {
        if candidate.is_feasible() != self.is_feasible {
            return Err(SearchError::Misclassified {
                id: candidate.id,
                expected_feasible: self.is_feasible,
            });
        }
        self.current_generation.push(candidate);
        Ok(())
    }

    /// Add migrants returned by the partner population.
    pub fn receive_migrants(&mut self, migrants: Vec<Candidate<S>>) -> Result<(), SearchError> {
        for candidate in migrants {
            self.insert(candidate)?;
        }
        Ok(())
    }

    /// Advance one generation: spawn, evaluate, partition, select.
    ///
    /// `partner` is accepted for cross-population scoring but is not read
    /// by the current algorithm.
    pub fn advance_generation<R: Rng + ?Sized>(
        &mut self,
        options: &NoveltySearchOptions,
        _partner: &Population<S>,
        archive: &mut NovelArchive<S>,
        rng: &mut R,
    ) -> Result<GenerationOutcome<S>, SearchError> {
        if self.current_generation.is_empty() {
            return Err(SearchError::EmptyPopulation {
                feasible: self.is_feasible,
            });
        }

        let mut children = self.spawn_children(options, rng)?;
        let spawned = children.len();

        // Children are scored against the generation-start snapshot only.
        let k = options.number_of_neighbours;
        {
            let population: &Population<S> = &*self;
            let archive: &NovelArchive<S> = &*archive;
            children.par_iter_mut().try_for_each(|child| {
                child.novelty = child.calculate_novelty(population, archive, k)?;
                Ok::<(), SearchError>(())
            })?;
        }

        let is_feasible = self.is_feasible;
        let (kept, returned): (Vec<_>, Vec<_>) = children
            .into_iter()
            .partition(|child| child.is_feasible() == is_feasible);

        let to_archive = if is_feasible {
            options.add_to_archive.min(kept.len())
        } else {
            0
        };
        let available = self.current_generation.len() + kept.len() - to_archive;
        if available < self.target_size {
            return Err(SearchError::PopulationUnderfilled {
                available,
                target: self.target_size,
            });
        }

        let mut pool = std::mem::take(&mut self.current_generation);
        pool.extend(kept);

        if is_feasible {
            // Stable sort keeps first-encountered order among equal novelty.
            pool.sort_by(|a, b| b.novelty.total_cmp(&a.novelty));
            let rest = pool.split_off(to_archive);
            archive.extend(pool);
            pool = rest;
        } else {
            pool.sort_by(|a, b| {
                a.distance_to_feasibility()
                    .total_cmp(&b.distance_to_feasibility())
            });
        }

        let discarded = pool.len() - self.target_size;
        pool.truncate(self.target_size);
        self.current_generation = pool;
        self.generation += 1;

        log::debug!(
            "{} population gen {}: spawned={}, archived={}, returned={}, discarded={}",
            if is_feasible { "Feasible" } else { "Infeasible" },
            self.generation,
            spawned,
            to_archive,
            returned.len(),
            discarded
        );

        Ok(GenerationOutcome {
            returned,
            spawned,
            archived: to_archive,
            retained: self.current_generation.len(),
            discarded,
        })
    }

    /// Create children from parents taken in index order, wrapping around.
    fn spawn_children<R: Rng + ?Sized>(
        &self,
        options: &NoveltySearchOptions,
        rng: &mut R,
    ) -> Result<Vec<Candidate<S>>, SearchError> {
        let parent_count = self.current_generation.len();
        let child_count = options.number_of_children.unwrap_or(parent_count);
        let generation = self.generation + 1;

        let mut offspring = Vec::with_capacity(child_count);
        for i in 0..child_count {
            let parent = &self.current_generation[i % parent_count];
            let mut parents = vec![parent.id];

            let mut genome = if options.recombine {
                let mate = &self.current_generation[rng.gen_range(0..parent_count)];
                parents.push(mate.id);
                parent.solution.recombine(&mate.solution, rng, options)?
            } else {
                parent.solution.clone()
            };

            if options.mutate {
                genome = genome.mutate(rng, options);
            }

            offspring.push((self.allocate_id(), genome, parents));
        }

        // Feasibility is the expensive part; evaluate it in parallel.
        Ok(offspring
            .into_par_iter()
            .map(|(id, genome, parents)| Candidate::new(id, genome, generation, parents))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::compute::domains::ScalarSolution;

    /// Walks a fixed distance towards feasibility on every mutation.
    #[derive(Debug, Clone, PartialEq)]
    struct Approach {
        distance: f64,
        step: f64,
    }

    impl Solution for Approach {
        fn mutate<R: Rng + ?Sized>(&self, _rng: &mut R, _options: &NoveltySearchOptions) -> Self {
            Self {
                distance: self.distance - self.step,
                step: self.step,
            }
        }

        fn distance_to_feasibility(&self) -> f64 {
            self.distance
        }

        fn novelty_distance(&self, other: &Self) -> f64 {
            (self.distance - other.distance).abs()
        }
    }

    fn frozen() -> NoveltySearchOptions {
        NoveltySearchOptions {
            mutate: false,
            recombine: false,
            number_of_neighbours: 1,
            add_to_archive: 0,
            ..Default::default()
        }
    }

    fn scalars(values: &[f64]) -> Vec<ScalarSolution> {
        values
            .iter()
            .map(|&v| ScalarSolution::new(v, 0.0, 100.0))
            .collect()
    }

    #[test]
    fn test_empty_population_fails() {
        let mut population = Population::<ScalarSolution>::new(true, 4);
        let partner = Population::new(false, 4);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = population.advance_generation(&frozen(), &partner, &mut archive, &mut rng);
        assert!(matches!(
            result,
            Err(SearchError::EmptyPopulation { feasible: true })
        ));
    }

    #[test]
    fn test_misclassified_insert_rejected() {
        let mut population = Population::new(true, 2);
        let result = population.add_solution(ScalarSolution::new(150.0, 0.0, 100.0));
        assert!(matches!(
            result,
            Err(SearchError::Misclassified {
                expected_feasible: true,
                ..
            })
        ));
        assert!(population.is_empty());
    }

    #[test]
    fn test_feasible_child_returned_from_infeasible_population() {
        let mut population = Population::from_solutions(
            false,
            2,
            vec![
                Approach { distance: 5.0, step: 5.0 },
                Approach { distance: 20.0, step: 1.0 },
            ],
        )
        .unwrap();
        let partner = Population::new(true, 2);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            mutate: true,
            ..frozen()
        };

        let outcome = population
            .advance_generation(&options, &partner, &mut archive, &mut rng)
            .unwrap();

        assert_eq!(outcome.returned.len(), 1);
        assert_eq!(outcome.returned[0].distance_to_feasibility(), 0.0);
        assert!(outcome.returned[0].is_feasible());
        assert!(
            population
                .current_generation()
                .iter()
                .all(|c| !c.is_feasible())
        );
        assert_eq!(population.len(), 2);
    }

    #[test]
    fn test_infeasible_selection_prefers_smaller_distance() {
        let mut population = Population::from_solutions(
            false,
            2,
            vec![
                Approach { distance: 10.0, step: 1.0 },
                Approach { distance: 30.0, step: 1.0 },
            ],
        )
        .unwrap();
        let partner = Population::new(true, 2);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            mutate: true,
            ..frozen()
        };

        population
            .advance_generation(&options, &partner, &mut archive, &mut rng)
            .unwrap();

        let distances: Vec<f64> = population
            .current_generation()
            .iter()
            .map(|c| c.distance_to_feasibility())
            .collect();
        assert_eq!(distances, vec![9.0, 10.0]);
    }

    #[test]
    fn test_archive_clamped_to_available_children() {
        let mut population =
            Population::from_solutions(true, 3, scalars(&[10.0, 20.0, 30.0])).unwrap();
        let partner = Population::new(false, 3);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            add_to_archive: 10,
            ..frozen()
        };

        let outcome = population
            .advance_generation(&options, &partner, &mut archive, &mut rng)
            .unwrap();

        assert_eq!(outcome.spawned, 3);
        assert_eq!(outcome.archived, 3);
        assert_eq!(archive.len(), 3);
        assert_eq!(population.len(), 3);
    }

    #[test]
    fn test_feasible_selection_by_novelty() {
        let mut population =
            Population::from_solutions(true, 4, scalars(&[0.0, 10.0, 20.0, 60.0])).unwrap();
        let partner = Population::new(false, 4);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            add_to_archive: 1,
            number_of_neighbours: 2,
            ..frozen()
        };

        population
            .advance_generation(&options, &partner, &mut archive, &mut rng)
            .unwrap();

        // The copy of 60 has the largest mean distance to its two nearest neighbours.
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get(0).unwrap().solution.value, 60.0);
        for retained in population.current_generation() {
            assert!(retained.novelty <= archive.get(0).unwrap().novelty);
        }
    }

    #[test]
    fn test_child_count_cycles_parents() {
        let mut population =
            Population::from_solutions(true, 2, scalars(&[10.0, 90.0])).unwrap();
        let partner = Population::new(false, 2);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            number_of_children: Some(5),
            ..frozen()
        };

        let outcome = population
            .advance_generation(&options, &partner, &mut archive, &mut rng)
            .unwrap();

        assert_eq!(outcome.spawned, 5);
        assert_eq!(outcome.retained + outcome.discarded, 7);
        assert_eq!(population.len(), 2);
    }

    #[test]
    fn test_underfilled_selection_fails() {
        // Two current individuals cannot refill a target of five.
        let mut population =
            Population::from_solutions(true, 5, scalars(&[10.0, 20.0])).unwrap();
        let partner = Population::new(false, 5);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = population.advance_generation(&frozen(), &partner, &mut archive, &mut rng);
        assert!(matches!(
            result,
            Err(SearchError::PopulationUnderfilled {
                available: 4,
                target: 5
            })
        ));
    }

    #[test]
    fn test_recombine_on_unsupported_domain_fails() {
        let mut population =
            Population::from_solutions(true, 2, scalars(&[10.0, 20.0])).unwrap();
        let partner = Population::new(false, 2);
        let mut archive = NovelArchive::new();
        let mut rng = StdRng::seed_from_u64(0);
        let options = NoveltySearchOptions {
            recombine: true,
            ..frozen()
        };

        let result = population.advance_generation(&options, &partner, &mut archive, &mut rng);
        assert!(matches!(result, Err(SearchError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_migrants_may_exceed_target() {
        let mut population =
            Population::from_solutions(true, 2, scalars(&[10.0, 20.0])).unwrap();
        let migrant = Candidate::new(100, ScalarSolution::new(30.0, 0.0, 100.0), 1, Vec::new());

        population.receive_migrants(vec![migrant]).unwrap();
        assert_eq!(population.len(), 3);
        assert_eq!(population.target_size(), 2);
    }
}
