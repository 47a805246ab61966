//! One real value constrained to an interval.
//!
//! The smallest domain the engine runs on; useful for validating search
//! mechanics where every distance can be checked by hand.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::compute::evolution::{Solution, SolutionFactory};
use crate::schema::{NoveltySearchOptions, ScalarDomain};

use super::gaussian_step;

/// A scalar genome with its valid interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarSolution {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl ScalarSolution {
    pub fn new(value: f64, min: f64, max: f64) -> Self {
        Self { value, min, max }
    }
}

impl Solution for ScalarSolution {
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, options: &NoveltySearchOptions) -> Self {
        let mut value = self.value;
        if rng.gen_bool(options.mutation_chance) {
            value += gaussian_step(rng, options.mutation_strength, self.max - self.min);
        }
        Self { value, ..*self }
    }

    /// Signed distance to the interval: negative inside, positive outside.
    fn distance_to_feasibility(&self) -> f64 {
        (self.min - self.value).max(self.value - self.max)
    }

    fn novelty_distance(&self, other: &Self) -> f64 {
        (self.value - other.value).abs()
    }
}

impl fmt::Display for ScalarSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} in [{}, {}]", self.value, self.min, self.max)
    }
}

/// Samples scalars from the interval widened by `spread` on each side.
#[derive(Debug, Clone)]
pub struct ScalarFactory {
    min: f64,
    max: f64,
    margin: f64,
}

impl ScalarFactory {
    pub fn new(domain: &ScalarDomain) -> Self {
        Self {
            min: domain.min,
            max: domain.max,
            margin: (domain.max - domain.min) * domain.spread,
        }
    }
}

impl SolutionFactory<ScalarSolution> for ScalarFactory {
    fn random_solution<R: Rng + ?Sized>(&self, rng: &mut R) -> ScalarSolution {
        let value = rng.gen_range((self.min - self.margin)..=(self.max + self.margin));
        ScalarSolution::new(value, self.min, self.max)
    }

    fn make_infeasible<R: Rng + ?Sized>(
        &self,
        feasible: &ScalarSolution,
        rng: &mut R,
    ) -> Option<ScalarSolution> {
        if self.margin <= 0.0 {
            return None;
        }
        let offset = rng.gen_range((0.01 * self.margin)..=self.margin);
        let value = if rng.gen_bool(0.5) {
            feasible.max + offset
        } else {
            feasible.min - offset
        };
        Some(ScalarSolution { value, ..*feasible })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_distance_to_feasibility() {
        assert!(ScalarSolution::new(5.0, 0.0, 10.0).distance_to_feasibility() < 0.0);
        assert_eq!(ScalarSolution::new(10.0, 0.0, 10.0).distance_to_feasibility(), 0.0);
        assert_eq!(ScalarSolution::new(13.0, 0.0, 10.0).distance_to_feasibility(), 3.0);
        assert_eq!(ScalarSolution::new(-2.0, 0.0, 10.0).distance_to_feasibility(), 2.0);
    }

    #[test]
    fn test_mutation_leaves_parent() {
        let mut rng = StdRng::seed_from_u64(42);
        let parent = ScalarSolution::new(5.0, 0.0, 10.0);
        let options = NoveltySearchOptions {
            mutation_chance: 1.0,
            ..Default::default()
        };

        let child = parent.mutate(&mut rng, &options);
        assert_eq!(parent.value, 5.0);
        assert_ne!(child.value, parent.value);
        assert_eq!((child.min, child.max), (0.0, 10.0));
    }

    #[test]
    fn test_zero_chance_copies() {
        let mut rng = StdRng::seed_from_u64(42);
        let parent = ScalarSolution::new(5.0, 0.0, 10.0);
        let options = NoveltySearchOptions {
            mutation_chance: 0.0,
            ..Default::default()
        };
        assert_eq!(parent.mutate(&mut rng, &options), parent);
    }

    #[test]
    fn test_make_infeasible() {
        let mut rng = StdRng::seed_from_u64(1);
        let factory = ScalarFactory::new(&ScalarDomain::default());
        let feasible = ScalarSolution::new(50.0, 0.0, 100.0);

        for _ in 0..20 {
            let perturbed = factory.make_infeasible(&feasible, &mut rng).unwrap();
            assert!(!perturbed.is_feasible());
        }
    }
}
