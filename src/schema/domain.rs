//! Domain selection for the command-line runner.

use serde::{Deserialize, Serialize};

use super::OptionsError;

/// Search domain and its constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainConfig {
    /// One real value constrained to an interval.
    Scalar(ScalarDomain),
    /// A real vector with per-gene bounds.
    Vector(VectorDomain),
    /// An open/wall grid that must stay connected.
    Grid(GridDomain),
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::Grid(GridDomain::default())
    }
}

impl DomainConfig {
    /// Validate domain parameters.
    pub fn validate(&self) -> Result<(), OptionsError> {
        match self {
            Self::Scalar(d) => d.validate(),
            Self::Vector(d) => d.validate(),
            Self::Grid(d) => d.validate(),
        }
    }
}

/// Scalar domain: feasible inside `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDomain {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_scalar_max")]
    pub max: f64,
    /// Extra sampling margin on each side, as a fraction of the range.
    #[serde(default = "default_spread")]
    pub spread: f64,
}

impl Default for ScalarDomain {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_scalar_max(),
            spread: default_spread(),
        }
    }
}

fn default_scalar_max() -> f64 {
    100.0
}
fn default_spread() -> f64 {
    0.5
}

impl ScalarDomain {
    fn validate(&self) -> Result<(), OptionsError> {
        check_bounds(self.min, self.max, "scalar")?;
        check_spread(self.spread)
    }
}

/// Vector domain: every gene inside its own bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDomain {
    /// Lower bound per gene.
    pub lower: Vec<f64>,
    /// Upper bound per gene.
    pub upper: Vec<f64>,
    /// Extra sampling margin on each side, as a fraction of each range.
    #[serde(default = "default_spread")]
    pub spread: f64,
}

impl Default for VectorDomain {
    fn default() -> Self {
        Self {
            lower: vec![0.0; 4],
            upper: vec![1.0; 4],
            spread: default_spread(),
        }
    }
}

impl VectorDomain {
    fn validate(&self) -> Result<(), OptionsError> {
        if self.lower.is_empty() || self.lower.len() != self.upper.len() {
            return Err(OptionsError::InvalidDomain(format!(
                "vector bounds have {} lower and {} upper entries",
                self.lower.len(),
                self.upper.len()
            )));
        }
        for (i, (&lo, &hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            check_bounds(lo, hi, &format!("gene {i}"))?;
        }
        check_spread(self.spread)
    }
}

/// Grid domain: open cells must be connected and cover a bounded share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDomain {
    #[serde(default = "default_grid_side")]
    pub width: usize,
    #[serde(default = "default_grid_side")]
    pub height: usize,
    /// Minimum share of open cells.
    #[serde(default = "default_min_open")]
    pub min_open: f64,
    /// Maximum share of open cells.
    #[serde(default = "default_max_open")]
    pub max_open: f64,
}

impl Default for GridDomain {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
            min_open: default_min_open(),
            max_open: default_max_open(),
        }
    }
}

fn default_grid_side() -> usize {
    16
}
fn default_min_open() -> f64 {
    0.35
}
fn default_max_open() -> f64 {
    0.65
}

impl GridDomain {
    fn validate(&self) -> Result<(), OptionsError> {
        if self.width == 0 || self.height == 0 {
            return Err(OptionsError::InvalidDomain(
                "grid dimensions must be non-zero".to_string(),
            ));
        }
        check_bounds(self.min_open, self.max_open, "open share")?;
        if self.min_open < 0.0 || self.max_open > 1.0 {
            return Err(OptionsError::InvalidDomain(format!(
                "open share [{}, {}] must lie in [0, 1]",
                self.min_open, self.max_open
            )));
        }
        Ok(())
    }
}

fn check_bounds(lo: f64, hi: f64, name: &str) -> Result<(), OptionsError> {
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        Err(OptionsError::InvalidDomain(format!(
            "{name} min ({lo}) > max ({hi})"
        )))
    } else {
        Ok(())
    }
}

fn check_spread(spread: f64) -> Result<(), OptionsError> {
    if spread.is_finite() && spread > 0.0 {
        Ok(())
    } else {
        Err(OptionsError::InvalidDomain(format!(
            "spread {spread} must be positive"
        )))
    }
}
