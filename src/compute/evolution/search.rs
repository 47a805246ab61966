//! The dual-population novelty searcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rand::Rng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::schema::{
    GenerationReport, NoveltySearchOptions, SearchConfig, SearchSummary, StopReason,
};

use super::{Candidate, NovelArchive, Population, SearchError, Solution, SolutionFactory};

/// Coevolves a feasible and an infeasible population, exchanging individuals
/// whose classification changes, while feeding an archive of novel
/// feasible candidates.
pub struct NoveltySearcher<S, R = StdRng> {
    options: NoveltySearchOptions,
    feasible: Population<S>,
    infeasible: Population<S>,
    archive: NovelArchive<S>,
    rng: R,
    generation: usize,
    feasible_to_infeasible: usize,
    infeasible_to_feasible: usize,
    next_id: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    halted: bool,
}

impl<S: Solution, R: Rng> NoveltySearcher<S, R> {
    /// Fill both populations from `factory` and bootstrap the archive.
    ///
    /// Feasible draws beyond the feasible target are offered to
    /// [`SolutionFactory::make_infeasible`] while the infeasible population is
    /// short. Fails with [`SearchError::SeedingTimeout`] if either population
    /// is still short after `config.seeding_attempts` draws.
    pub fn seed<F>(config: &SearchConfig, factory: &F, mut rng: R) -> Result<Self, SearchError>
    where
        F: SolutionFactory<S>,
    {
        config.validate()?;

        let next_id = Arc::new(AtomicU64::new(0));
        let mut feasible =
            Population::new(true, config.feasible_size).with_id_source(Arc::clone(&next_id));
        let mut infeasible =
            Population::new(false, config.infeasible_size).with_id_source(Arc::clone(&next_id));

        let mut attempts = 0;
        while (feasible.len() < config.feasible_size || infeasible.len() < config.infeasible_size)
            && attempts < config.seeding_attempts
        {
            attempts += 1;
            let solution = factory.random_solution(&mut rng);
            let candidate = Candidate::new(feasible.allocate_id(), solution, 0, Vec::new());

            if !candidate.is_feasible() {
                if infeasible.len() < config.infeasible_size {
                    infeasible.insert(candidate)?;
                }
            } else if feasible.len() < config.feasible_size {
                feasible.insert(candidate)?;
            } else if infeasible.len() < config.infeasible_size
                && let Some(perturbed) = factory.make_infeasible(&candidate.solution, &mut rng)
            {
                let perturbed =
                    Candidate::new(infeasible.allocate_id(), perturbed, 0, vec![candidate.id]);
                if !perturbed.is_feasible() {
                    infeasible.insert(perturbed)?;
                }
            }
        }

        if feasible.len() < config.feasible_size || infeasible.len() < config.infeasible_size {
            return Err(SearchError::SeedingTimeout {
                attempts,
                feasible: feasible.len(),
                infeasible: infeasible.len(),
            });
        }

        log::info!(
            "Seeded {} feasible and {} infeasible individuals in {} attempts",
            feasible.len(),
            infeasible.len(),
            attempts
        );

        Self::from_populations(config.options.clone(), feasible, infeasible, rng)
    }

    /// Build a searcher from prepared populations and bootstrap the archive.
    pub fn from_populations(
        options: NoveltySearchOptions,
        feasible: Population<S>,
        infeasible: Population<S>,
        rng: R,
    ) -> Result<Self, SearchError> {
        options.validate()?;

        if feasible.is_empty() {
            return Err(SearchError::EmptyPopulation { feasible: true });
        }
        if infeasible.is_empty() {
            return Err(SearchError::EmptyPopulation { feasible: false });
        }

        // Both populations must draw ids from one counter.
        let shared = Arc::ptr_eq(&feasible.id_source(), &infeasible.id_source());
        let (feasible, infeasible, next_id) = if shared {
            let next_id = feasible.id_source();
            (feasible, infeasible, next_id)
        } else {
            let start = feasible
                .current_generation()
                .iter()
                .chain(infeasible.current_generation())
                .map(|c| c.id + 1)
                .max()
                .unwrap_or(0)
                .max(feasible.id_source().load(Ordering::Relaxed))
                .max(infeasible.id_source().load(Ordering::Relaxed));
            let next_id = Arc::new(AtomicU64::new(start));
            (
                reassign_ids(feasible, &next_id)?,
                reassign_ids(infeasible, &next_id)?,
                next_id,
            )
        };

        let mut searcher = Self {
            options,
            feasible,
            infeasible,
            archive: NovelArchive::new(),
            rng,
            generation: 0,
            feasible_to_infeasible: 0,
            infeasible_to_feasible: 0,
            next_id,
            cancelled: Arc::new(AtomicBool::new(false)),
            halted: false,
        };

        searcher.bootstrap_archive()?;
        Ok(searcher)
    }

    /// Score the initial feasible population and archive copies of every
    /// individual at or above `minimum_novelty`.
    fn bootstrap_archive(&mut self) -> Result<usize, SearchError> {
        let k = self.options.number_of_neighbours;
        let novelties: Vec<f64> = {
            let population = &self.feasible;
            let archive = &self.archive;
            population
                .current_generation()
                .par_iter()
                .map(|c| c.calculate_novelty(population, archive, k))
                .collect::<Result<_, _>>()?
        };

        let mut archived = 0;
        for (candidate, novelty) in self
            .feasible
            .current_generation_mut()
            .iter_mut()
            .zip(novelties)
        {
            candidate.novelty = novelty;
            if novelty >= self.options.minimum_novelty {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.archive.push(candidate.copy_with_id(id));
                archived += 1;
            }
        }

        log::info!(
            "Bootstrap archived {} of {} feasible individuals (minimum novelty {})",
            archived,
            self.feasible.len(),
            self.options.minimum_novelty
        );
        Ok(archived)
    }

    /// Get cancellation handle. Cancellation is honoured between generations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Run options.
    pub fn options(&self) -> &NoveltySearchOptions {
        &self.options
    }

    /// The feasible population.
    pub fn feasible(&self) -> &Population<S> {
        &self.feasible
    }

    /// The infeasible population.
    pub fn infeasible(&self) -> &Population<S> {
        &self.infeasible
    }

    /// The novelty archive.
    pub fn archive(&self) -> &NovelArchive<S> {
        &self.archive
    }

    /// Generations completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Whether a failed generation has stopped this searcher.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Advance both populations by one generation and exchange migrants.
    ///
    /// A failed generation may leave the populations partly advanced, so the
    /// searcher halts and every later call fails with [`SearchError::Halted`].
    pub fn next_generation(&mut self) -> Result<GenerationReport, SearchError> {
        if self.halted {
            return Err(SearchError::Halted {
                generation: self.generation,
            });
        }

        let result = self.advance_and_migrate();
        if let Err(e) = &result {
            self.halted = true;
            log::error!("Generation {} failed, halting search: {}", self.generation + 1, e);
        }
        result
    }

    fn advance_and_migrate(&mut self) -> Result<GenerationReport, SearchError> {
        let feasible_outcome = self.feasible.advance_generation(
            &self.options,
            &self.infeasible,
            &mut self.archive,
            &mut self.rng,
        )?;
        let infeasible_outcome = match self.infeasible.advance_generation(
            &self.options,
            &self.feasible,
            &mut self.archive,
            &mut self.rng,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(
                    "Infeasible advance failed; dropping {} feasible->infeasible migrants",
                    feasible_outcome.returned.len()
                );
                return Err(e);
            }
        };

        self.generation += 1;

        let (best_novelty, mean_novelty) = novelty_stats(&self.feasible);
        let report = GenerationReport {
            generation: self.generation,
            feasible_size: self.feasible.len(),
            infeasible_size: self.infeasible.len(),
            archive_size: self.archive.len(),
            archived: feasible_outcome.archived,
            feasible_to_infeasible: feasible_outcome.returned.len(),
            infeasible_to_feasible: infeasible_outcome.returned.len(),
            best_novelty,
            mean_novelty,
            best_distance_to_feasibility: self
                .infeasible
                .current_generation()
                .iter()
                .map(|c| c.distance_to_feasibility())
                .min_by(|a, b| a.total_cmp(b)),
        };

        self.feasible_to_infeasible += report.feasible_to_infeasible;
        self.infeasible_to_feasible += report.infeasible_to_feasible;

        // Arrivals compete on novelty measured against the feasible side.
        let mut arrivals = infeasible_outcome.returned;
        let k = self.options.number_of_neighbours;
        {
            let feasible = &self.feasible;
            let archive = &self.archive;
            let rescored = arrivals.par_iter_mut().try_for_each(|migrant| {
                migrant.novelty = migrant.calculate_novelty(feasible, archive, k)?;
                Ok::<(), SearchError>(())
            });
            if let Err(e) = rescored {
                log::error!(
                    "Rescoring failed; dropping {} feasible->infeasible and {} infeasible->feasible migrants",
                    feasible_outcome.returned.len(),
                    arrivals.len()
                );
                return Err(e);
            }
        }

        self.infeasible.receive_migrants(feasible_outcome.returned)?;
        self.feasible.receive_migrants(arrivals)?;

        log::info!(
            "Generation {}: archive={} (+{}), migrants feasible->infeasible={}, infeasible->feasible={}, best novelty={:.4}",
            report.generation,
            report.archive_size,
            report.archived,
            report.feasible_to_infeasible,
            report.infeasible_to_feasible,
            report.best_novelty
        );

        Ok(report)
    }

    /// Run `generations` generations with progress callback.
    pub fn run_with_callback<F>(
        &mut self,
        generations: usize,
        mut callback: F,
    ) -> Result<SearchSummary, SearchError>
    where
        F: FnMut(&GenerationReport),
    {
        let start_time = std::time::Instant::now();
        let first = self.generation;

        let stop_reason = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if self.generation - first >= generations {
                break StopReason::MaxGenerations;
            }

            let report = self.next_generation()?;
            callback(&report);
        };

        if stop_reason == StopReason::Cancelled {
            log::warn!("Search cancelled after generation {}", self.generation);
        }

        Ok(SearchSummary {
            generations: self.generation - first,
            stop_reason,
            archive_size: self.archive.len(),
            feasible_to_infeasible: self.feasible_to_infeasible,
            infeasible_to_feasible: self.infeasible_to_feasible,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Run `generations` generations (blocking).
    pub fn run(&mut self, generations: usize) -> Result<SearchSummary, SearchError> {
        self.run_with_callback(generations, |_| {})
    }
}

/// Re-number a population's candidates from a shared counter.
fn reassign_ids<S: Solution>(
    population: Population<S>,
    next_id: &Arc<AtomicU64>,
) -> Result<Population<S>, SearchError> {
    let mut renumbered = Population::new(population.is_feasible(), population.target_size())
        .with_id_source(Arc::clone(next_id));
    for candidate in population.current_generation() {
        renumbered.insert(candidate.copy_with_id(renumbered.allocate_id()))?;
    }
    Ok(renumbered)
}

fn novelty_stats<S>(population: &Population<S>) -> (f64, f64)
where
    S: Solution,
{
    let candidates = population.current_generation();
    if candidates.is_empty() {
        return (0.0, 0.0);
    }
    let best = candidates
        .iter()
        .map(|c| c.novelty)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean = candidates.iter().map(|c| c.novelty).sum::<f64>() / candidates.len() as f64;
    (best, mean)
}
