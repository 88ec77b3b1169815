//! Engine thrust model driven by tabulated nozzle performance.
//!
//! A [`ThrustCalculator`] wraps a loaded [`TableInterpolator`], holds the nozzle
//! throat area, and turns (Pc, ṁ, Pa) readings into thrust using
//! `F = Cf · Pc · At`. Units follow the table generator: psi, in², lbf, lbm/s.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use thrust_tables::{TableError, TableInterpolator};

mod calculator;

pub use calculator::{
    DesignPoint, MASS_FLOW_MAX_ITERATIONS, MASS_FLOW_TOLERANCE, MassFlowSolution, ThrustCalculator,
};
pub use thrust_tables::PerformanceRecord;

/// Coarse failure categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No table loaded, or no throat area configured yet.
    NotLoaded,
    /// An argument was out of its valid range.
    InvalidArgument,
    /// The table does not cover the interpolation cell being queried.
    MissingCoverage,
    /// The table source could not be read or held no usable rows.
    Data,
}

/// Errors surfaced by the thrust model.
#[derive(Debug, Error)]
pub enum ThrustError {
    #[error("performance table not loaded")]
    NotLoaded,
    #[error("thrust calculator not ready: load a table and set the throat area")]
    NotReady,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl ThrustError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLoaded | Self::NotReady => ErrorKind::NotLoaded,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Table(TableError::NotLoaded) => ErrorKind::NotLoaded,
            Self::Table(TableError::InvalidCoordinate(_)) => ErrorKind::InvalidArgument,
            Self::Table(TableError::MissingCoverage { .. }) => ErrorKind::MissingCoverage,
            Self::Table(TableError::Open { .. } | TableError::Csv(_) | TableError::Empty) => {
                ErrorKind::Data
            }
        }
    }
}

/// Load a table from `path` into a shareable handle for several calculators.
pub fn shared_table<P: AsRef<Path>>(path: P) -> Result<Arc<TableInterpolator>, ThrustError> {
    Ok(Arc::new(TableInterpolator::from_path(path)?))
}
