//! Performance table loading and interpolation.
//!
//! Tables are produced by an external thermochemistry tool as CSV files sampled
//! over chamber pressure, mixture ratio and ambient pressure. [`TableInterpolator`]
//! rebuilds the grid from those rows and answers point queries by trilinear
//! interpolation, clamping at the table edges.

use std::path::PathBuf;

use thiserror::Error;

pub mod axis;
mod interpolator;
mod parse;
pub mod record;

pub use axis::{Axis, Bracket};
pub use interpolator::{TableBounds, TableInterpolator};
pub use record::{FIELDS_PER_ROW, PerformanceRecord, TableEntry};

/// Errors surfaced while loading or querying a performance table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open performance table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read performance table: {0}")]
    Csv(#[from] csv::Error),
    #[error("performance table contains no valid entries")]
    Empty,
    #[error("performance table not loaded")]
    NotLoaded,
    #[error("query coordinate {0} is not a number")]
    InvalidCoordinate(f64),
    #[error("unable to interpolate: missing table entries at grid cell ({pc}, {of}, {pa})")]
    MissingCoverage { pc: usize, of: usize, pa: usize },
}
