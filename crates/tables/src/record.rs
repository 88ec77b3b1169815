use serde::Serialize;

/// Number of numeric fields in one table row: three coordinates plus six performance values.
pub const FIELDS_PER_ROW: usize = 9;

/// Interpolated (or tabulated) nozzle performance at one operating point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceRecord {
    /// Thrust coefficient `Cf` (dimensionless).
    pub thrust_coefficient: f64,
    /// Characteristic velocity `C*` (m/s).
    pub cstar_m_s: f64,
    /// Specific impulse (s).
    pub isp_s: f64,
    /// Nozzle exit velocity (m/s).
    pub exit_velocity_m_s: f64,
    /// Nozzle exit pressure (psi).
    pub exit_pressure_psi: f64,
    /// Ratio of specific heats.
    pub gamma: f64,
}

impl PerformanceRecord {
    /// Build a record whose fields are `f(a, b)` applied fieldwise.
    pub(crate) fn zip_with(a: &Self, b: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            thrust_coefficient: f(a.thrust_coefficient, b.thrust_coefficient),
            cstar_m_s: f(a.cstar_m_s, b.cstar_m_s),
            isp_s: f(a.isp_s, b.isp_s),
            exit_velocity_m_s: f(a.exit_velocity_m_s, b.exit_velocity_m_s),
            exit_pressure_psi: f(a.exit_pressure_psi, b.exit_pressure_psi),
            gamma: f(a.gamma, b.gamma),
        }
    }

    /// Linear blend `a·(1 − t) + b·t` of every field.
    pub fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self::zip_with(a, b, |x, y| x * (1.0 - t) + y * t)
    }
}

/// One tabulated sample: the grid coordinates and the performance found there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableEntry {
    pub chamber_pressure_psi: f64,
    pub mixture_ratio: f64,
    pub ambient_pressure_psi: f64,
    pub performance: PerformanceRecord,
}

impl TableEntry {
    /// Build an entry from a full row in file order: `Pc,OF,Pa,Cf,Cstar,Isp,Ve,Pe,Gamma`.
    pub fn from_row(row: &[f64; FIELDS_PER_ROW]) -> Self {
        Self {
            chamber_pressure_psi: row[0],
            mixture_ratio: row[1],
            ambient_pressure_psi: row[2],
            performance: PerformanceRecord {
                thrust_coefficient: row[3],
                cstar_m_s: row[4],
                isp_s: row[5],
                exit_velocity_m_s: row[6],
                exit_pressure_psi: row[7],
                gamma: row[8],
            },
        }
    }

    /// Coordinates in axis order (Pc, O/F, Pa).
    pub fn coordinates(&self) -> [f64; 3] {
        [
            self.chamber_pressure_psi,
            self.mixture_ratio,
            self.ambient_pressure_psi,
        ]
    }
}
