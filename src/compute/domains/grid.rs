//! Open/wall grids that must stay connected.
//!
//! A stand-in for a two-dimensional map genome: a grid is feasible when its
//! open share lies within bounds and every open cell can reach every other
//! through 4-connected moves.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::compute::evolution::{SearchError, Solution, SolutionFactory};
use crate::schema::{GridDomain, NoveltySearchOptions};

use super::crossover_points;

/// Constraints every grid in a run is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridConstraints {
    pub width: usize,
    pub height: usize,
    pub min_open: f64,
    pub max_open: f64,
}

impl From<&GridDomain> for GridConstraints {
    fn from(domain: &GridDomain) -> Self {
        Self {
            width: domain.width,
            height: domain.height,
            min_open: domain.min_open,
            max_open: domain.max_open,
        }
    }
}

/// A grid of open (`true`) and wall (`false`) cells, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridMap {
    constraints: GridConstraints,
    cells: Vec<bool>,
}

impl GridMap {
    /// Create a grid. `cells` must hold `width * height` entries.
    pub fn new(constraints: GridConstraints, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), constraints.width * constraints.height);
        Self { constraints, cells }
    }

    pub fn width(&self) -> usize {
        self.constraints.width
    }

    pub fn height(&self) -> usize {
        self.constraints.height
    }

    /// Whether the cell at `(x, y)` is open.
    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width() + x]
    }

    /// Share of open cells.
    pub fn open_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().filter(|&&c| c).count() as f64 / self.cells.len() as f64
    }

    /// Number of 4-connected open regions.
    pub fn open_components(&self) -> usize {
        let (width, height) = (self.width(), self.height());
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        let mut components = 0;

        for start in 0..self.cells.len() {
            if !self.cells[start] || seen[start] {
                continue;
            }
            components += 1;
            seen[start] = true;
            queue.push_back(start);

            while let Some(index) = queue.pop_front() {
                let (x, y) = (index % width, index / width);
                let neighbours = [
                    (x > 0).then(|| index - 1),
                    (x + 1 < width).then(|| index + 1),
                    (y > 0).then(|| index - width),
                    (y + 1 < height).then(|| index + width),
                ];
                for next in neighbours.into_iter().flatten() {
                    if self.cells[next] && !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        components
    }

    fn has_open_neighbour(&self, index: usize) -> bool {
        let (width, height) = (self.width(), self.height());
        let (x, y) = (index % width, index / width);
        (x > 0 && self.cells[index - 1])
            || (x + 1 < width && self.cells[index + 1])
            || (y > 0 && self.cells[index - width])
            || (y + 1 < height && self.cells[index + width])
    }
}

impl Solution for GridMap {
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, options: &NoveltySearchOptions) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|&open| if rng.gen_bool(options.mutation_chance) { !open } else { open })
            .collect();
        Self::new(self.constraints, cells)
    }

    /// Swaps whole rows between parents.
    fn recombine<R: Rng + ?Sized>(
        &self,
        other: &Self,
        rng: &mut R,
        options: &NoveltySearchOptions,
    ) -> Result<Self, SearchError> {
        let width = self.width();
        let (start, end) = crossover_points(rng, self.height(), options.two_point_crossover);
        let mut cells = self.cells.clone();
        cells[start * width..end * width].copy_from_slice(&other.cells[start * width..end * width]);
        Ok(Self::new(self.constraints, cells))
    }

    /// Extra open regions plus the open-share violation measured in cells.
    fn distance_to_feasibility(&self) -> f64 {
        let ratio = self.open_ratio();
        let violation = (self.constraints.min_open - ratio)
            .max(ratio - self.constraints.max_open)
            .max(0.0);
        let components = self.open_components();

        let disconnected = match components {
            0 => 1.0,
            n => (n - 1) as f64,
        };
        disconnected + violation * self.cells.len() as f64
    }

    /// Share of cells that differ.
    fn novelty_distance(&self, other: &Self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let differing = self
            .cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a != b)
            .count();
        differing as f64 / self.cells.len() as f64
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width()) {
            for &open in row {
                write!(f, "{}", if open { '.' } else { '#' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Produces grids by random walks (connected) and by uniform noise (usually not).
#[derive(Debug, Clone)]
pub struct GridFactory {
    constraints: GridConstraints,
}

impl GridFactory {
    pub fn new(domain: &GridDomain) -> Self {
        Self {
            constraints: GridConstraints::from(domain),
        }
    }

    /// Carve a connected region with a random walk from the centre.
    fn carve<R: Rng + ?Sized>(&self, rng: &mut R) -> GridMap {
        let GridConstraints { width, height, .. } = self.constraints;
        let total = width * height;
        let fewest = ((self.constraints.min_open * total as f64).ceil() as usize).clamp(1, total);
        let most = ((self.constraints.max_open * total as f64).floor() as usize).clamp(fewest, total);
        let target = rng.gen_range(fewest..=most);

        let mut cells = vec![false; total];
        let (mut x, mut y) = (width / 2, height / 2);
        cells[y * width + x] = true;
        let mut open = 1;

        let mut steps = 0;
        while open < target && steps < total * 64 {
            steps += 1;
            match rng.gen_range(0..4) {
                0 if x > 0 => x -= 1,
                1 if x + 1 < width => x += 1,
                2 if y > 0 => y -= 1,
                3 if y + 1 < height => y += 1,
                _ => continue,
            }
            let index = y * width + x;
            if !cells[index] {
                cells[index] = true;
                open += 1;
            }
        }

        GridMap::new(self.constraints, cells)
    }
}

impl SolutionFactory<GridMap> for GridFactory {
    fn random_solution<R: Rng + ?Sized>(&self, rng: &mut R) -> GridMap {
        if rng.gen_bool(0.5) {
            self.carve(rng)
        } else {
            let fill = (self.constraints.min_open + self.constraints.max_open) / 2.0;
            let cells = (0..self.constraints.width * self.constraints.height)
                .map(|_| rng.gen_bool(fill))
                .collect();
            GridMap::new(self.constraints, cells)
        }
    }

    /// Open an isolated wall cell, splitting off a new region.
    fn make_infeasible<R: Rng + ?Sized>(&self, feasible: &GridMap, rng: &mut R) -> Option<GridMap> {
        let isolated: Vec<usize> = (0..feasible.cells.len())
            .filter(|&i| !feasible.cells[i] && !feasible.has_open_neighbour(i))
            .collect();
        if isolated.is_empty() {
            return None;
        }

        let mut cells = feasible.cells.clone();
        cells[isolated[rng.gen_range(0..isolated.len())]] = true;
        Some(GridMap::new(self.constraints, cells))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn constraints(width: usize, height: usize) -> GridConstraints {
        GridConstraints {
            width,
            height,
            min_open: 0.2,
            max_open: 0.8,
        }
    }

    fn parse(rows: &[&str]) -> GridMap {
        let cells = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '.'))
            .collect();
        GridMap::new(constraints(rows[0].len(), rows.len()), cells)
    }

    #[test]
    fn test_connected_grid_is_feasible() {
        let grid = parse(&["..##", "#..#", "##..", "####"]);
        assert_eq!(grid.open_components(), 1);
        assert!(grid.is_feasible());
    }

    #[test]
    fn test_disconnected_grid_distance() {
        let grid = parse(&[".#.#", "####", ".#..", "####"]);
        assert_eq!(grid.open_components(), 4);
        assert_eq!(grid.distance_to_feasibility(), 3.0);
    }

    #[test]
    fn test_open_share_violation() {
        // 15 of 16 open exceeds the 0.8 cap by 0.1375, i.e. 2.2 cells.
        let grid = parse(&["....", "....", "....", "...#"]);
        assert_eq!(grid.open_components(), 1);
        assert!((grid.distance_to_feasibility() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_carved_grids_are_connected() {
        let mut rng = StdRng::seed_from_u64(3);
        let factory = GridFactory::new(&GridDomain {
            width: 12,
            height: 10,
            ..Default::default()
        });

        for _ in 0..10 {
            let grid = factory.carve(&mut rng);
            assert_eq!(grid.open_components(), 1);
            assert!(grid.is_feasible());
        }
    }

    #[test]
    fn test_make_infeasible_splits_region() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = parse(&["....", "....", "####", "####"]);
        let factory = GridFactory {
            constraints: constraints(4, 4),
        };

        let broken = factory.make_infeasible(&grid, &mut rng).unwrap();
        assert_eq!(broken.open_components(), 2);
        assert!(!broken.is_feasible());
    }

    #[test]
    fn test_row_crossover() {
        let mut rng = StdRng::seed_from_u64(9);
        let open = parse(&["....", "....", "....", "...."]);
        let walls = parse(&["####", "####", "####", "####"]);
        let options = NoveltySearchOptions::default();

        let child = open.recombine(&walls, &mut rng, &options).unwrap();
        assert!(child.is_open(0, 0));
        assert!(!child.is_open(0, 3));
        assert!((0..4).all(|y| (0..4).all(|x| child.is_open(x, y) == child.is_open(0, y))));
    }

    #[test]
    fn test_hamming_novelty_distance() {
        let a = parse(&["....", "....", "####", "####"]);
        let b = parse(&["....", "####", "####", "####"]);
        assert!((a.novelty_distance(&b) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let grid = parse(&[".#", "#."]);
        assert_eq!(grid.to_string(), ".#\n#.\n");
    }
}
