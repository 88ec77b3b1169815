use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use log::info;
use rpa_thrust::config::{EngineConfig, SizingConfig, load_engine_configs};
use rpa_thrust::constants::SEA_LEVEL_PSI;
use rpa_thrust::engine::{self, Evaluation, EvaluationMode, size_calculator};
use rpa_thrust::export::report::{self, Mode, Record, ReportWriter};
use rpa_thrust::export::summary::{PointFailure, RunSummary, write_summary_json};
use rpa_thrust::units::lbf_to_n;
use rpa_thrust::{PerformanceRecord, TableInterpolator, ThrustCalculator};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Rocket performance table lookup and thrust calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the coordinate ranges covered by a performance table
    Bounds {
        /// Performance table CSV
        #[arg(long)]
        table: PathBuf,
        /// Print the bounds as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interpolate the performance record at one (Pc, O/F, Pa) point
    Query {
        /// Performance table CSV
        #[arg(long)]
        table: PathBuf,
        /// Chamber pressure in psi
        #[arg(long)]
        pc: f64,
        /// Oxidizer-to-fuel mass ratio
        #[arg(long)]
        of: f64,
        /// Ambient pressure in psi
        #[arg(long, default_value_t = SEA_LEVEL_PSI)]
        pa: f64,
        /// Print the record as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Thrust from chamber pressure and both propellant flows
    Thrust {
        /// Performance table CSV
        #[arg(long)]
        table: PathBuf,
        #[command(flatten)]
        sizing: SizingArgs,
        /// Chamber pressure in psi
        #[arg(long)]
        pc: f64,
        /// Oxidizer flow in lbm/s
        #[arg(long)]
        mdot_ox: f64,
        /// Fuel flow in lbm/s
        #[arg(long)]
        mdot_fuel: f64,
        /// Ambient pressure in psi
        #[arg(long, default_value_t = SEA_LEVEL_PSI)]
        pa: f64,
    },
    /// Thrust from total propellant flow, solving for chamber pressure
    MassFlow {
        /// Performance table CSV
        #[arg(long)]
        table: PathBuf,
        #[command(flatten)]
        sizing: SizingArgs,
        /// Total propellant flow in lbm/s
        #[arg(long)]
        mdot: f64,
        /// Oxidizer-to-fuel mass ratio
        #[arg(long)]
        of: f64,
        /// Ambient pressure in psi
        #[arg(long, default_value_t = SEA_LEVEL_PSI)]
        pa: f64,
    },
    /// Evaluate every operating point of one or more engine configs
    Run {
        /// Engine config (YAML or TOML) or a directory of TOML configs
        #[arg(long)]
        config: PathBuf,
        /// CSV report path (`-` for stdout)
        #[arg(long, default_value = "-")]
        output: PathBuf,
        /// Optional JSON summary path
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

/// Throat sizing: either a known area or a design point to size from.
#[derive(Args)]
struct SizingArgs {
    /// Throat area in square inches
    #[arg(
        long,
        conflicts_with = "design_thrust",
        required_unless_present = "design_thrust"
    )]
    throat_area: Option<f64>,
    /// Design thrust in lbf; sizes the throat from the table
    #[arg(long, requires_all = ["design_pc", "design_of"])]
    design_thrust: Option<f64>,
    /// Design chamber pressure in psi
    #[arg(long)]
    design_pc: Option<f64>,
    /// Design mixture ratio
    #[arg(long)]
    design_of: Option<f64>,
    /// Design ambient pressure in psi
    #[arg(long, default_value_t = SEA_LEVEL_PSI)]
    design_pa: f64,
}

impl SizingArgs {
    fn to_config(&self) -> Result<SizingConfig> {
        match (
            self.throat_area,
            self.design_thrust,
            self.design_pc,
            self.design_of,
        ) {
            (Some(throat_area_in2), _, _, _) => Ok(SizingConfig::ThroatArea { throat_area_in2 }),
            (None, Some(thrust_lbf), Some(chamber_pressure_psi), Some(mixture_ratio)) => {
                Ok(SizingConfig::DesignPoint {
                    thrust_lbf,
                    chamber_pressure_psi,
                    mixture_ratio,
                    ambient_pressure_psi: self.design_pa,
                })
            }
            _ => Err(anyhow!(
                "provide --throat-area, or --design-thrust with --design-pc and --design-of"
            )),
        }
    }
}

fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Bounds { table, json } => print_bounds(&table, json),
        Command::Query {
            table,
            pc,
            of,
            pa,
            json,
        } => {
            let table = load_table(&table)?;
            let record = table.query(pc, of, pa)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Pc {pc:.3} psi, O/F {of:.4}, Pa {pa:.3} psi");
                print_performance(&record);
            }
            Ok(())
        }
        Command::Thrust {
            table,
            sizing,
            pc,
            mdot_ox,
            mdot_fuel,
            pa,
        } => {
            let mut calc = sized_calculator(&table, &sizing)?;
            let thrust = calc.calculate_thrust(pc, mdot_ox, mdot_fuel, pa)?;
            println!(
                "Thrust: {:.2} lbf ({:.2} N), throat area {:.4} in^2",
                thrust,
                lbf_to_n(thrust),
                calc.throat_area()
            );
            if let Some(record) = calc.last_performance() {
                print_performance(record);
            }
            Ok(())
        }
        Command::MassFlow {
            table,
            sizing,
            mdot,
            of,
            pa,
        } => {
            let mut calc = sized_calculator(&table, &sizing)?;
            let solution = calc.solve_mass_flow(mdot, of, pa)?;
            println!(
                "Thrust: {:.2} lbf ({:.2} N), throat area {:.4} in^2",
                solution.thrust_lbf,
                lbf_to_n(solution.thrust_lbf),
                calc.throat_area()
            );
            println!(
                "Chamber pressure: {:.3} psi after {} iteration(s){}",
                solution.chamber_pressure_psi,
                solution.iterations,
                if solution.converged {
                    ""
                } else {
                    " (not converged)"
                }
            );
            if let Some(record) = calc.last_performance() {
                print_performance(record);
            }
            Ok(())
        }
        Command::Run {
            config,
            output,
            summary,
        } => run(&config, &output, summary.as_deref()),
    }
}

fn load_table(path: &Path) -> Result<TableInterpolator> {
    let table = TableInterpolator::from_path(path)
        .with_context(|| format!("loading performance table {}", path.display()))?;
    info!("loaded {} entries from {}", table.len(), path.display());
    Ok(table)
}

fn sized_calculator(table: &Path, sizing: &SizingArgs) -> Result<ThrustCalculator> {
    let sizing = sizing.to_config()?;
    let calc = ThrustCalculator::with_table(Arc::new(load_table(table)?));
    Ok(size_calculator(calc, &sizing)?)
}

fn print_bounds(path: &Path, json: bool) -> Result<()> {
    let table = load_table(path)?;
    let bounds = table.bounds()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&bounds)?);
        return Ok(());
    }
    println!("Entries: {}", table.len());
    if let Some(axes) = table.axes() {
        let names = ["Chamber pressure (psi)", "Mixture ratio", "Ambient pressure (psi)"];
        for (name, axis) in names.iter().zip(axes) {
            println!("{name}: {} grid values", axis.len());
        }
    }
    let (lo, hi) = bounds.chamber_pressure_psi;
    println!("Pc: {lo:.3} .. {hi:.3} psi");
    let (lo, hi) = bounds.mixture_ratio;
    println!("O/F: {lo:.4} .. {hi:.4}");
    let (lo, hi) = bounds.ambient_pressure_psi;
    println!("Pa: {lo:.3} .. {hi:.3} psi");
    Ok(())
}

fn print_performance(record: &PerformanceRecord) {
    println!(
        "Cf {:.5}, C* {:.2} m/s, Isp {:.2} s, Ve {:.2} m/s, Pe {:.3} psi, gamma {:.4}",
        record.thrust_coefficient,
        record.cstar_m_s,
        record.isp_s,
        record.exit_velocity_m_s,
        record.exit_pressure_psi,
        record.gamma
    );
}

fn run(config: &Path, output: &Path, summary_path: Option<&Path>) -> Result<()> {
    let engines = load_engine_configs(config)
        .with_context(|| format!("loading engine config {}", config.display()))?;
    let mut writer = report::report_writer(output)?;
    report::write_header(&mut writer)?;

    let mut summaries = Vec::with_capacity(engines.len());
    for engine_config in &engines {
        summaries.push(run_engine(engine_config, &mut writer)?);
    }
    writer.flush()?;

    if let Some(path) = summary_path {
        write_summary_json(path, &summaries)
            .with_context(|| format!("writing summary {}", path.display()))?;
        info!("summary written to {}", path.display());
    }
    if summaries.iter().all(|summary| summary.error.is_some()) {
        bail!("no engine in {} could be set up", config.display());
    }
    Ok(())
}

fn run_engine(config: &EngineConfig, writer: &mut ReportWriter) -> Result<RunSummary> {
    let mut summary = RunSummary {
        engine: config.name.clone(),
        table: config.table.display().to_string(),
        table_entries: 0,
        throat_area_in2: 0.0,
        points_evaluated: 0,
        points_failed: 0,
        unconverged_solves: 0,
        max_thrust_lbf: None,
        failures: Vec::new(),
        error: None,
    };
    let mut calc = match engine::build_calculator(config) {
        Ok(calc) => calc,
        Err(err) => {
            eprintln!("{err}");
            summary.error = Some(err.to_string());
            return Ok(summary);
        }
    };
    summary.table_entries = calc.table().map(|table| table.len()).unwrap_or_default();
    summary.throat_area_in2 = calc.throat_area();
    info!(
        "engine `{}`: throat area {:.4} in^2, {} operating point(s)",
        config.name,
        summary.throat_area_in2,
        config.operating_points.len()
    );

    for (index, point) in config.operating_points.iter().enumerate() {
        match engine::evaluate(&mut calc, point) {
            Ok(evaluation) => {
                record_for(&config.name, &evaluation).write_to(writer)?;
                summary.points_evaluated += 1;
                if let EvaluationMode::MassFlow {
                    converged: false, ..
                } = evaluation.mode
                {
                    summary.unconverged_solves += 1;
                }
                summary.max_thrust_lbf = Some(
                    summary
                        .max_thrust_lbf
                        .map_or(evaluation.thrust_lbf, |max| max.max(evaluation.thrust_lbf)),
                );
            }
            Err(err) => {
                eprintln!("{}: operating point {index}: {err}", config.name);
                summary.points_failed += 1;
                summary.failures.push(PointFailure {
                    index,
                    error: err.to_string(),
                });
            }
        }
    }
    Ok(summary)
}

fn record_for<'a>(engine: &'a str, evaluation: &Evaluation) -> Record<'a> {
    let mode = match evaluation.mode {
        EvaluationMode::Injector => Mode::Injector,
        EvaluationMode::MassFlow {
            iterations,
            converged,
        } => Mode::MassFlow {
            iterations,
            converged,
        },
    };
    Record {
        engine,
        mode,
        chamber_pressure_psi: evaluation.chamber_pressure_psi,
        mixture_ratio: evaluation.mixture_ratio,
        ambient_pressure_psi: evaluation.ambient_pressure_psi,
        total_flow_lbm_s: evaluation.total_flow_lbm_s,
        thrust_lbf: evaluation.thrust_lbf,
        thrust_n: lbf_to_n(evaluation.thrust_lbf),
        cf: evaluation.performance.thrust_coefficient,
        cstar_m_s: evaluation.performance.cstar_m_s,
        isp_s: evaluation.performance.isp_s,
    }
}
