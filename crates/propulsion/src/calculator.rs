use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use thrust_core::relations::{implied_chamber_pressure_psi, throat_area_in2, thrust_lbf};
use thrust_tables::{PerformanceRecord, TableInterpolator};

use crate::ThrustError;

/// Iteration cap for the mass-flow chamber-pressure solve.
pub const MASS_FLOW_MAX_ITERATIONS: usize = 10;
/// Relative change in chamber pressure accepted as converged.
pub const MASS_FLOW_TOLERANCE: f64 = 0.01;

/// Reference operating condition used to size the nozzle throat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignPoint {
    pub thrust_lbf: f64,
    pub chamber_pressure_psi: f64,
    pub mixture_ratio: f64,
    pub ambient_pressure_psi: f64,
}

/// Outcome of the mass-flow driven chamber-pressure solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassFlowSolution {
    pub thrust_lbf: f64,
    pub chamber_pressure_psi: f64,
    /// Table queries performed.
    pub iterations: usize,
    /// False when the iteration cap was reached first; the last estimate is still used.
    pub converged: bool,
}

/// Thrust model for a single engine.
///
/// The calculator mutates its sizing and last-result state on every call, so each
/// simulated engine needs its own instance. The table itself is immutable and may
/// be shared between calculators with [`ThrustCalculator::with_table`].
#[derive(Debug, Clone, Default)]
pub struct ThrustCalculator {
    table: Option<Arc<TableInterpolator>>,
    throat_area_in2: f64,
    last_performance: Option<PerformanceRecord>,
}

impl ThrustCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a calculator around an already loaded table.
    pub fn with_table(table: Arc<TableInterpolator>) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    /// Load a fresh performance table from `path`, replacing any previous one.
    ///
    /// Returns the number of table entries. On failure the calculator has no table.
    pub fn load_performance_table<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<usize, ThrustError> {
        self.table = None;
        let table = TableInterpolator::from_path(path)?;
        let count = table.len();
        self.table = Some(Arc::new(table));
        Ok(count)
    }

    /// Install a shared table, replacing any previous one.
    pub fn set_table(&mut self, table: Arc<TableInterpolator>) {
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&Arc<TableInterpolator>> {
        self.table.as_ref()
    }

    fn loaded_table(&self) -> Result<&TableInterpolator, ThrustError> {
        match self.table.as_deref() {
            Some(table) if table.is_loaded() => Ok(table),
            _ => Err(ThrustError::NotLoaded),
        }
    }

    /// Set the nozzle throat area directly.
    pub fn set_throat_area(&mut self, area_in2: f64) -> Result<(), ThrustError> {
        if !(area_in2.is_finite() && area_in2 > 0.0) {
            return Err(ThrustError::InvalidArgument("throat area must be positive"));
        }
        self.throat_area_in2 = area_in2;
        Ok(())
    }

    /// Configured throat area, or zero if none has been set.
    pub fn throat_area(&self) -> f64 {
        self.throat_area_in2
    }

    /// True once a table is loaded and a throat area is configured.
    pub fn is_ready(&self) -> bool {
        self.loaded_table().is_ok() && self.throat_area_in2 > 0.0
    }

    /// Performance from the most recent successful thrust calculation.
    pub fn last_performance(&self) -> Option<&PerformanceRecord> {
        self.last_performance.as_ref()
    }

    /// Size the throat so the engine produces the design thrust at the design point.
    ///
    /// Returns the new throat area. A non-physical result (non-positive `Cf · Pc`)
    /// is rejected and the previous area is kept.
    pub fn size_from_design_point(&mut self, design: &DesignPoint) -> Result<f64, ThrustError> {
        let table = self.loaded_table()?;
        let perf = table.query(
            design.chamber_pressure_psi,
            design.mixture_ratio,
            design.ambient_pressure_psi,
        )?;

        let area = throat_area_in2(
            design.thrust_lbf,
            perf.thrust_coefficient,
            design.chamber_pressure_psi,
        );
        if !(area.is_finite() && area > 0.0) {
            return Err(ThrustError::InvalidArgument(
                "design point does not yield a positive throat area",
            ));
        }

        self.throat_area_in2 = area;
        info!(
            "sized throat to {area:.4} in^2 for {:.1} lbf at Pc={} psi (Cf={:.4})",
            design.thrust_lbf, design.chamber_pressure_psi, perf.thrust_coefficient
        );
        Ok(area)
    }

    fn ensure_ready(&self) -> Result<&TableInterpolator, ThrustError> {
        let table = self.loaded_table().map_err(|_| ThrustError::NotReady)?;
        if self.throat_area_in2 <= 0.0 {
            return Err(ThrustError::NotReady);
        }
        Ok(table)
    }

    /// Thrust (lbf) from measured chamber pressure and propellant flows.
    pub fn calculate_thrust(
        &mut self,
        chamber_pressure_psi: f64,
        oxidizer_flow_lbm_s: f64,
        fuel_flow_lbm_s: f64,
        ambient_pressure_psi: f64,
    ) -> Result<f64, ThrustError> {
        let table = self.ensure_ready()?;
        if fuel_flow_lbm_s <= 0.0 {
            return Err(ThrustError::InvalidArgument(
                "fuel mass flow rate must be positive",
            ));
        }
        let mixture_ratio = oxidizer_flow_lbm_s / fuel_flow_lbm_s;

        let perf = table.query(chamber_pressure_psi, mixture_ratio, ambient_pressure_psi)?;
        self.last_performance = Some(perf);

        Ok(thrust_lbf(
            perf.thrust_coefficient,
            chamber_pressure_psi,
            self.throat_area_in2,
        ))
    }

    /// Thrust (lbf) when only the total propellant flow is known.
    pub fn calculate_thrust_from_mass_flow(
        &mut self,
        total_flow_lbm_s: f64,
        mixture_ratio: f64,
        ambient_pressure_psi: f64,
    ) -> Result<f64, ThrustError> {
        self.solve_mass_flow(total_flow_lbm_s, mixture_ratio, ambient_pressure_psi)
            .map(|solution| solution.thrust_lbf)
    }

    /// Find the chamber pressure consistent with `total_flow_lbm_s` through the throat.
    ///
    /// Starts at the middle of the table's Pc range and iterates the damped update
    /// `Pc ← (Pc + ṁ·C*/(gc·At)) / 2` until the implied pressure is within
    /// [`MASS_FLOW_TOLERANCE`] of the guess, for at most [`MASS_FLOW_MAX_ITERATIONS`]
    /// table queries. Thrust uses the `Cf` from the last query.
    pub fn solve_mass_flow(
        &mut self,
        total_flow_lbm_s: f64,
        mixture_ratio: f64,
        ambient_pressure_psi: f64,
    ) -> Result<MassFlowSolution, ThrustError> {
        let table = self.ensure_ready()?;
        let at = self.throat_area_in2;
        let (pc_min, pc_max) = table.bounds()?.chamber_pressure_psi;

        let mut pc_guess = 0.5 * (pc_min + pc_max);
        let mut perf = None;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < MASS_FLOW_MAX_ITERATIONS {
            let current = table.query(pc_guess, mixture_ratio, ambient_pressure_psi)?;
            perf = Some(current);
            iterations += 1;

            let pc_implied =
                implied_chamber_pressure_psi(total_flow_lbm_s, current.cstar_m_s, at);
            let error = (pc_implied - pc_guess).abs() / pc_guess;
            debug!(
                "mass-flow iteration {iterations}: Pc guess {pc_guess:.3}, implied {pc_implied:.3}"
            );

            if error < MASS_FLOW_TOLERANCE {
                pc_guess = pc_implied;
                converged = true;
                break;
            }
            pc_guess = 0.5 * (pc_guess + pc_implied);
        }

        let Some(perf) = perf else {
            return Err(ThrustError::NotReady);
        };
        self.last_performance = Some(perf);

        if !converged {
            warn!(
                "chamber pressure did not converge within {MASS_FLOW_MAX_ITERATIONS} iterations \
                 (mdot={total_flow_lbm_s} lbm/s, O/F={mixture_ratio}); using Pc={pc_guess:.3} psi"
            );
        }

        Ok(MassFlowSolution {
            thrust_lbf: thrust_lbf(perf.thrust_coefficient, pc_guess, at),
            chamber_pressure_psi: pc_guess,
            iterations,
            converged,
        })
    }
}
