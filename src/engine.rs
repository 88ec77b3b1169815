//! Glue between engine configuration files and the thrust model.

use std::sync::Arc;

use thiserror::Error;
use thrust_config::{EngineConfig, OperatingPointConfig, SizingConfig};
use thrust_propulsion::{DesignPoint, ThrustCalculator, ThrustError};
use thrust_tables::{PerformanceRecord, TableInterpolator};

/// Errors surfaced while turning a configuration into a ready calculator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine `{name}`: {source}")]
    Setup {
        name: String,
        #[source]
        source: ThrustError,
    },
}

/// How an operating point was evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvaluationMode {
    Injector,
    MassFlow { iterations: usize, converged: bool },
}

/// Result of evaluating one operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mode: EvaluationMode,
    pub chamber_pressure_psi: f64,
    pub mixture_ratio: f64,
    pub ambient_pressure_psi: f64,
    pub total_flow_lbm_s: f64,
    pub thrust_lbf: f64,
    pub performance: PerformanceRecord,
}

/// Load the configured table and size the throat.
pub fn build_calculator(config: &EngineConfig) -> Result<ThrustCalculator, EngineError> {
    let setup = |source: ThrustError| EngineError::Setup {
        name: config.name.clone(),
        source,
    };
    let table = TableInterpolator::from_path(&config.table)
        .map_err(|err| setup(ThrustError::from(err)))?;
    size_calculator(ThrustCalculator::with_table(Arc::new(table)), &config.sizing).map_err(setup)
}

/// Apply a sizing rule to a calculator that already holds a table.
pub fn size_calculator(
    mut calculator: ThrustCalculator,
    sizing: &SizingConfig,
) -> Result<ThrustCalculator, ThrustError> {
    match *sizing {
        SizingConfig::ThroatArea { throat_area_in2 } => {
            calculator.set_throat_area(throat_area_in2)?;
        }
        SizingConfig::DesignPoint {
            thrust_lbf,
            chamber_pressure_psi,
            mixture_ratio,
            ambient_pressure_psi,
        } => {
            calculator.size_from_design_point(&DesignPoint {
                thrust_lbf,
                chamber_pressure_psi,
                mixture_ratio,
                ambient_pressure_psi,
            })?;
        }
    }
    Ok(calculator)
}

/// Evaluate thrust at one configured operating point.
pub fn evaluate(
    calculator: &mut ThrustCalculator,
    point: &OperatingPointConfig,
) -> Result<Evaluation, ThrustError> {
    match *point {
        OperatingPointConfig::Injector {
            chamber_pressure_psi,
            oxidizer_flow_lbm_s,
            fuel_flow_lbm_s,
            ambient_pressure_psi,
        } => {
            let thrust_lbf = calculator.calculate_thrust(
                chamber_pressure_psi,
                oxidizer_flow_lbm_s,
                fuel_flow_lbm_s,
                ambient_pressure_psi,
            )?;
            Ok(Evaluation {
                mode: EvaluationMode::Injector,
                chamber_pressure_psi,
                mixture_ratio: oxidizer_flow_lbm_s / fuel_flow_lbm_s,
                ambient_pressure_psi,
                total_flow_lbm_s: oxidizer_flow_lbm_s + fuel_flow_lbm_s,
                thrust_lbf,
                performance: last_performance(calculator)?,
            })
        }
        OperatingPointConfig::MassFlow {
            total_flow_lbm_s,
            mixture_ratio,
            ambient_pressure_psi,
        } => {
            let solution =
                calculator.solve_mass_flow(total_flow_lbm_s, mixture_ratio, ambient_pressure_psi)?;
            Ok(Evaluation {
                mode: EvaluationMode::MassFlow {
                    iterations: solution.iterations,
                    converged: solution.converged,
                },
                chamber_pressure_psi: solution.chamber_pressure_psi,
                mixture_ratio,
                ambient_pressure_psi,
                total_flow_lbm_s,
                thrust_lbf: solution.thrust_lbf,
                performance: last_performance(calculator)?,
            })
        }
    }
}

fn last_performance(calculator: &ThrustCalculator) -> Result<PerformanceRecord, ThrustError> {
    calculator
        .last_performance()
        .copied()
        .ok_or(ThrustError::NotReady)
}
