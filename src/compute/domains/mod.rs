//! Reference solution domains.
//!
//! Each domain supplies a [`Solution`](super::Solution) type and a
//! [`SolutionFactory`](super::SolutionFactory) that seeds it.

mod grid;
mod scalar;
mod vector;

pub use grid::{GridConstraints, GridFactory, GridMap};
pub use scalar::{ScalarFactory, ScalarSolution};
pub use vector::{VectorFactory, VectorSolution, VectorSpace};

use rand::Rng;
use rand_distr::StandardNormal;

/// Gaussian perturbation scaled by `strength` times the gene's range.
pub(crate) fn gaussian_step<R: Rng + ?Sized>(rng: &mut R, strength: f64, range: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * strength * range
}

/// Segment `[start, end)` a child copies from its second parent.
///
/// Single-point crossover replaces a non-empty suffix; two-point crossover a
/// non-empty window anywhere. Sequences shorter than two yield an empty segment.
pub(crate) fn crossover_points<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    two_point: bool,
) -> (usize, usize) {
    if len < 2 {
        return (len, len);
    }
    if two_point {
        let start = rng.gen_range(0..len);
        let end = rng.gen_range(start + 1..=len);
        (start, end)
    } else {
        (rng.gen_range(1..len), len)
    }
}
