//! Real vectors with per-gene bounds.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::compute::evolution::{SearchError, Solution, SolutionFactory};
use crate::schema::{NoveltySearchOptions, VectorDomain};

use super::{crossover_points, gaussian_step};

/// Bounds shared by every vector in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSpace {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl VectorSpace {
    /// Number of genes.
    pub fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn range(&self, gene: usize) -> f64 {
        self.upper[gene] - self.lower[gene]
    }
}

impl From<&VectorDomain> for VectorSpace {
    fn from(domain: &VectorDomain) -> Self {
        Self {
            lower: domain.lower.clone(),
            upper: domain.upper.clone(),
        }
    }
}

/// A real-valued genome.
#[derive(Debug, Clone, Serialize)]
pub struct VectorSolution {
    genes: Vec<f64>,
    #[serde(skip)]
    space: Arc<VectorSpace>,
}

impl VectorSolution {
    /// Create a solution. `genes` must match the space's dimensions.
    pub fn new(genes: Vec<f64>, space: Arc<VectorSpace>) -> Self {
        debug_assert_eq!(genes.len(), space.dimensions());
        Self { genes, space }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }
}

impl PartialEq for VectorSolution {
    fn eq(&self, other: &Self) -> bool {
        self.genes == other.genes
    }
}

impl Solution for VectorSolution {
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, options: &NoveltySearchOptions) -> Self {
        let genes = self
            .genes
            .iter()
            .enumerate()
            .map(|(i, &gene)| {
                if rng.gen_bool(options.mutation_chance) {
                    gene + gaussian_step(rng, options.mutation_strength, self.space.range(i))
                } else {
                    gene
                }
            })
            .collect();

        Self::new(genes, Arc::clone(&self.space))
    }

    fn recombine<R: Rng + ?Sized>(
        &self,
        other: &Self,
        rng: &mut R,
        options: &NoveltySearchOptions,
    ) -> Result<Self, SearchError> {
        let (start, end) = crossover_points(rng, self.genes.len(), options.two_point_crossover);
        let mut genes = self.genes.clone();
        genes[start..end].copy_from_slice(&other.genes[start..end]);
        Ok(Self::new(genes, Arc::clone(&self.space)))
    }

    /// Total bound violation over all genes.
    fn distance_to_feasibility(&self) -> f64 {
        self.genes
            .iter()
            .zip(self.space.lower.iter().zip(&self.space.upper))
            .map(|(&g, (&lo, &hi))| (lo - g).max(g - hi).max(0.0))
            .sum()
    }

    fn novelty_distance(&self, other: &Self) -> f64 {
        self.genes
            .iter()
            .zip(&other.genes)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl fmt::Display for VectorSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{gene:.4}")?;
        }
        write!(f, "]")
    }
}

/// Samples vectors from the bounds widened by `spread` on each side.
#[derive(Debug, Clone)]
pub struct VectorFactory {
    space: Arc<VectorSpace>,
    spread: f64,
}

impl VectorFactory {
    pub fn new(space: Arc<VectorSpace>, spread: f64) -> Self {
        Self { space, spread }
    }
}

impl SolutionFactory<VectorSolution> for VectorFactory {
    fn random_solution<R: Rng + ?Sized>(&self, rng: &mut R) -> VectorSolution {
        let genes = (0..self.space.dimensions())
            .map(|i| {
                let margin = self.space.range(i) * self.spread;
                rng.gen_range((self.space.lower[i] - margin)..=(self.space.upper[i] + margin))
            })
            .collect();
        VectorSolution::new(genes, Arc::clone(&self.space))
    }

    /// Push one random gene past its upper bound.
    fn make_infeasible<R: Rng + ?Sized>(
        &self,
        feasible: &VectorSolution,
        rng: &mut R,
    ) -> Option<VectorSolution> {
        let gene = rng.gen_range(0..self.space.dimensions());
        let margin = self.space.range(gene) * self.spread;
        if margin <= 0.0 {
            return None;
        }
        let mut genes = feasible.genes.clone();
        genes[gene] = self.space.upper[gene] + rng.gen_range((0.01 * margin)..=margin);
        Some(VectorSolution::new(genes, Arc::clone(&self.space)))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn unit_space(n: usize) -> Arc<VectorSpace> {
        Arc::new(VectorSpace {
            lower: vec![0.0; n],
            upper: vec![1.0; n],
        })
    }

    #[test]
    fn test_distance_to_feasibility() {
        let space = unit_space(3);
        let inside = VectorSolution::new(vec![0.2, 0.5, 1.0], Arc::clone(&space));
        let outside = VectorSolution::new(vec![-0.5, 0.5, 1.25], space);

        assert_eq!(inside.distance_to_feasibility(), 0.0);
        assert!(inside.is_feasible());
        assert!((outside.distance_to_feasibility() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_euclidean_novelty_distance() {
        let space = unit_space(2);
        let a = VectorSolution::new(vec![0.0, 0.0], Arc::clone(&space));
        let b = VectorSolution::new(vec![0.3, 0.4], space);
        assert!((a.novelty_distance(&b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_crossover_takes_genes_from_both_parents() {
        let space = unit_space(6);
        let a = VectorSolution::new(vec![0.0; 6], Arc::clone(&space));
        let b = VectorSolution::new(vec![1.0; 6], space);
        let mut rng = StdRng::seed_from_u64(42);

        for two_point in [false, true] {
            let options = NoveltySearchOptions {
                two_point_crossover: two_point,
                ..Default::default()
            };
            for _ in 0..20 {
                let child = a.recombine(&b, &mut rng, &options).unwrap();
                assert_eq!(child.genes().len(), 6);
                assert!(child.genes().iter().all(|&g| g == 0.0 || g == 1.0));
                assert!(child.genes().contains(&1.0));
                if !two_point {
                    // Single-point children keep a prefix from the first parent.
                    assert_eq!(child.genes()[0], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_factory_and_perturbation() {
        let mut rng = StdRng::seed_from_u64(7);
        let domain = VectorDomain::default();
        let factory = VectorFactory::new(Arc::new(VectorSpace::from(&domain)), domain.spread);

        let feasible = VectorSolution::new(vec![0.5; 4], Arc::new(VectorSpace::from(&domain)));
        for _ in 0..20 {
            let sample = factory.random_solution(&mut rng);
            assert_eq!(sample.genes().len(), 4);
            assert!(!factory.make_infeasible(&feasible, &mut rng).unwrap().is_feasible());
        }
    }
}
