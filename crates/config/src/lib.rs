//! Engine configuration models and loaders.
//!
//! An engine file names the performance table, how the throat is sized, and a list
//! of operating points to evaluate. Files may be YAML or TOML; a directory is read
//! as a set of TOML files.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use thrust_core::constants::SEA_LEVEL_PSI;

/// One engine definition.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    /// Performance table CSV. Relative paths resolve against the config file's directory.
    pub table: PathBuf,
    pub sizing: SizingConfig,
    #[serde(default)]
    pub operating_points: Vec<OperatingPointConfig>,
}

/// How the nozzle throat area is obtained.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SizingConfig {
    #[serde(rename = "throat_area")]
    ThroatArea { throat_area_in2: f64 },
    #[serde(rename = "design_point")]
    DesignPoint {
        thrust_lbf: f64,
        chamber_pressure_psi: f64,
        mixture_ratio: f64,
        #[serde(default = "sea_level_psi")]
        ambient_pressure_psi: f64,
    },
}

/// A single condition at which thrust is evaluated.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum OperatingPointConfig {
    /// Chamber pressure and both propellant flows are known.
    #[serde(rename = "injector")]
    Injector {
        chamber_pressure_psi: f64,
        oxidizer_flow_lbm_s: f64,
        fuel_flow_lbm_s: f64,
        #[serde(default = "sea_level_psi")]
        ambient_pressure_psi: f64,
    },
    /// Only the total propellant flow and mixture ratio are known.
    #[serde(rename = "mass_flow")]
    MassFlow {
        total_flow_lbm_s: f64,
        mixture_ratio: f64,
        #[serde(default = "sea_level_psi")]
        ambient_pressure_psi: f64,
    },
}

fn sea_level_psi() -> f64 {
    SEA_LEVEL_PSI
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid engine config `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

impl EngineConfig {
    /// Check values the thrust model would reject later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        match &self.sizing {
            SizingConfig::ThroatArea { throat_area_in2 } if *throat_area_in2 <= 0.0 => {
                return Err(invalid("throat_area_in2 must be positive"));
            }
            SizingConfig::DesignPoint {
                thrust_lbf,
                chamber_pressure_psi,
                ..
            } if *thrust_lbf <= 0.0 || *chamber_pressure_psi <= 0.0 => {
                return Err(invalid(
                    "design thrust and chamber pressure must be positive",
                ));
            }
            _ => {}
        }

        for point in &self.operating_points {
            match point {
                OperatingPointConfig::Injector {
                    fuel_flow_lbm_s, ..
                } if *fuel_flow_lbm_s <= 0.0 => {
                    return Err(invalid("fuel_flow_lbm_s must be positive"));
                }
                OperatingPointConfig::MassFlow {
                    total_flow_lbm_s, ..
                } if *total_flow_lbm_s <= 0.0 => {
                    return Err(invalid("total_flow_lbm_s must be positive"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Load and validate a single engine configuration file.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let mut config: EngineConfig = read_file(path)?;
    resolve_table_path(&mut config, path);
    config.validate()?;
    Ok(config)
}

/// Load engine configurations from a file or a directory of TOML files.
pub fn load_engine_configs<P: AsRef<Path>>(path: P) -> Result<Vec<EngineConfig>, ConfigError> {
    let path = path.as_ref();
    if path.is_dir() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
            .collect();
        entries.sort();
        entries.iter().map(load_engine_config).collect()
    } else {
        Ok(vec![load_engine_config(path)?])
    }
}

fn read_file<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn resolve_table_path(config: &mut EngineConfig, config_path: &Path) {
    if config.table.is_relative() {
        if let Some(parent) = config_path.parent() {
            config.table = parent.join(&config.table);
        }
    }
}
