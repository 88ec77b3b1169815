//! Tabulated rocket engine performance and thrust calculation.
//!
//! The member crates are re-exported here so front-ends (CLI, simulators) can
//! depend on a single library:
//!
//! - [`tables`]: performance table loading and trilinear interpolation
//! - [`propulsion`]: throat sizing and thrust from chamber pressure or mass flow
//! - [`config`]: engine configuration files
//! - [`export`]: CSV/JSON report writers

pub mod engine;

pub use thrust_config as config;
pub use thrust_core::{constants, relations, units};
pub use thrust_export as export;
pub use thrust_propulsion as propulsion;
pub use thrust_tables as tables;

pub use thrust_propulsion::{
    DesignPoint, ErrorKind, MassFlowSolution, ThrustCalculator, ThrustError,
};
pub use thrust_tables::{PerformanceRecord, TableBounds, TableError, TableInterpolator};

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
