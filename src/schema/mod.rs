//! Schema module - Configuration and reporting types for novelty search runs.

mod domain;
mod options;
mod report;

pub use domain::*;
pub use options::*;
pub use report::*;
