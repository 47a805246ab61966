//! Configuration types for constrained novelty search runs.
//!
//! [`NoveltySearchOptions`] is the immutable per-run configuration consumed by
//! the engine. [`SearchConfig`] adds the population sizes, generation count and
//! seeding budget needed to start a run, and [`RunConfig`] binds a search to a
//! domain for the command-line runner.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::DomainConfig;

/// Variation, novelty and archiving options shared by both populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltySearchOptions {
    /// Apply the mutation operator when spawning children.
    #[serde(default = "default_mutate")]
    pub mutate: bool,
    /// Apply the recombination operator when spawning children.
    #[serde(default)]
    pub recombine: bool,
    /// Per-gene probability used by domains during mutation (0.0-1.0).
    #[serde(default = "default_mutation_chance")]
    pub mutation_chance: f64,
    /// Mutation step, as a fraction of a gene's valid range.
    #[serde(default = "default_mutation_strength")]
    pub mutation_strength: f64,
    /// Two-point instead of single-point crossover.
    #[serde(default)]
    pub two_point_crossover: bool,
    /// Number of nearest neighbours averaged for novelty (k).
    #[serde(default = "default_number_of_neighbours")]
    pub number_of_neighbours: usize,
    /// Feasible individuals promoted to the archive per generation.
    #[serde(default = "default_add_to_archive")]
    pub add_to_archive: usize,
    /// Novelty needed for an initial individual to be archived at bootstrap.
    #[serde(default = "default_minimum_novelty")]
    pub minimum_novelty: f64,
    /// Explicit child count per generation.
    /// If None, each current individual spawns one child.
    #[serde(default)]
    pub number_of_children: Option<usize>,
}

impl Default for NoveltySearchOptions {
    fn default() -> Self {
        Self {
            mutate: default_mutate(),
            recombine: false,
            mutation_chance: default_mutation_chance(),
            mutation_strength: default_mutation_strength(),
            two_point_crossover: false,
            number_of_neighbours: default_number_of_neighbours(),
            add_to_archive: default_add_to_archive(),
            minimum_novelty: default_minimum_novelty(),
            number_of_children: None,
        }
    }
}

fn default_mutate() -> bool {
    true
}
fn default_mutation_chance() -> f64 {
    0.3
}
fn default_mutation_strength() -> f64 {
    0.1
}
fn default_number_of_neighbours() -> usize {
    3
}
fn default_add_to_archive() -> usize {
    1
}
fn default_minimum_novelty() -> f64 {
    0.2
}

impl NoveltySearchOptions {
    /// Validate option ranges.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.number_of_neighbours == 0 {
            return Err(OptionsError::NoNeighbours);
        }

        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(OptionsError::InvalidMutationChance(self.mutation_chance));
        }

        if !self.mutation_strength.is_finite() || self.mutation_strength < 0.0 {
            return Err(OptionsError::InvalidMutationStrength(
                self.mutation_strength,
            ));
        }

        if self.minimum_novelty.is_nan() || self.minimum_novelty < 0.0 {
            return Err(OptionsError::InvalidMinimumNovelty(self.minimum_novelty));
        }

        if self.number_of_children == Some(0) {
            return Err(OptionsError::NoChildren);
        }

        if !self.mutate && !self.recombine {
            log::warn!("Mutation and recombination are both disabled; children will copy parents");
        }

        Ok(())
    }
}

/// Everything needed to seed and run a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Engine options.
    #[serde(default)]
    pub options: NoveltySearchOptions,
    /// Target size of the feasible population.
    #[serde(default = "default_population_size")]
    pub feasible_size: usize,
    /// Target size of the infeasible population.
    #[serde(default = "default_population_size")]
    pub infeasible_size: usize,
    /// Generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Maximum factory draws while filling the initial populations.
    #[serde(default = "default_seeding_attempts")]
    pub seeding_attempts: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            options: NoveltySearchOptions::default(),
            feasible_size: default_population_size(),
            infeasible_size: default_population_size(),
            generations: default_generations(),
            seeding_attempts: default_seeding_attempts(),
            random_seed: None,
        }
    }
}

fn default_population_size() -> usize {
    20
}
fn default_generations() -> usize {
    50
}
fn default_seeding_attempts() -> usize {
    10_000
}

impl SearchConfig {
    /// Validate options and population sizes.
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.options.validate()?;

        if self.feasible_size == 0 {
            return Err(OptionsError::EmptyTarget { feasible: true });
        }
        if self.infeasible_size == 0 {
            return Err(OptionsError::EmptyTarget { feasible: false });
        }

        // Bootstrap scores each feasible individual against the others only.
        let k = self.options.number_of_neighbours;
        if k >= self.feasible_size {
            return Err(OptionsError::NeighboursExceedPopulation {
                k,
                size: self.feasible_size,
                feasible: true,
            });
        }
        if k > self.infeasible_size {
            return Err(OptionsError::NeighboursExceedPopulation {
                k,
                size: self.infeasible_size,
                feasible: false,
            });
        }

        if self.seeding_attempts == 0 {
            return Err(OptionsError::NoSeedingAttempts);
        }

        Ok(())
    }
}

/// A search bound to a domain, as read by the command-line runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Domain to search.
    pub domain: DomainConfig,
    /// Search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Directory to export the archive to after the run.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            domain: DomainConfig::default(),
            search: SearchConfig::default(),
            output_dir: None,
        }
    }
}

impl RunConfig {
    /// Load and validate a run configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.search.validate()?;
        config.domain.validate()?;
        Ok(config)
    }
}

fn population_label(feasible: &bool) -> &'static str {
    if *feasible { "feasible" } else { "infeasible" }
}

/// Option validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionsError {
    #[error("Number of neighbours must be at least 1")]
    NoNeighbours,
    #[error("Mutation chance {0} must lie in [0, 1]")]
    InvalidMutationChance(f64),
    #[error("Mutation strength {0} must be finite and non-negative")]
    InvalidMutationStrength(f64),
    #[error("Minimum novelty {0} must be non-negative")]
    InvalidMinimumNovelty(f64),
    #[error("Number of children must be at least 1 when set")]
    NoChildren,
    #[error("Target size of the {} population must be non-zero", population_label(.feasible))]
    EmptyTarget { feasible: bool },
    #[error(
        "{k} neighbours cannot be drawn from a {} population of {size}",
        population_label(.feasible)
    )]
    NeighboursExceedPopulation {
        k: usize,
        size: usize,
        feasible: bool,
    },
    #[error("Seeding attempts must be non-zero")]
    NoSeedingAttempts,
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
}

/// Errors raised while loading a [`RunConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] OptionsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_neighbours() {
        let options = NoveltySearchOptions {
            number_of_neighbours: 0,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::NoNeighbours));
    }

    #[test]
    fn test_rejects_bad_mutation_chance() {
        let options = NoveltySearchOptions {
            mutation_chance: 1.5,
            ..Default::default()
        };
        assert_eq!(
            options.validate(),
            Err(OptionsError::InvalidMutationChance(1.5))
        );
    }

    #[test]
    fn test_rejects_zero_children() {
        let options = NoveltySearchOptions {
            number_of_children: Some(0),
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::NoChildren));
    }

    #[test]
    fn test_neighbours_must_fit_feasible_population() {
        let config = SearchConfig {
            feasible_size: 3,
            options: NoveltySearchOptions {
                number_of_neighbours: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptionsError::NeighboursExceedPopulation { feasible: true, .. })
        ));
    }

    #[test]
    fn test_options_defaults_from_empty_json() {
        let options: NoveltySearchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, NoveltySearchOptions::default());
    }

    #[test]
    fn test_serialization() {
        let config = SearchConfig {
            random_seed: Some(7),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_run_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{
                "domain": { "type": "scalar", "min": 0.0, "max": 10.0 },
                "search": { "feasible_size": 8, "infeasible_size": 8, "random_seed": 3 }
            }"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.search.feasible_size, 8);
        assert_eq!(config.search.random_seed, Some(3));
        assert!(matches!(config.domain, DomainConfig::Scalar(_)));
    }

    #[test]
    fn test_load_rejects_invalid_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{ "domain": { "type": "scalar" }, "search": { "feasible_size": 0 } }"#,
        )
        .unwrap();

        assert!(matches!(
            RunConfig::load(&path),
            Err(ConfigLoadError::Invalid(OptionsError::EmptyTarget { feasible: true }))
        ));
    }
}
