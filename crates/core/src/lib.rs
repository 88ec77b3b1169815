//! Core constants and unit helpers for the thrust calculator workspace.
//!
//! Performance tables carry characteristic and exhaust velocities in SI units while
//! the engine model works in US customary units (psi, in², lbf, lbm/s).

/// Physical constants.
pub mod constants {
    /// Newton's proportionality constant, lbm·ft/(lbf·s²).
    pub const GC_LBM_FT_LBF_S2: f64 = 32.174;
    /// Feet per metre, at the precision the tables are generated with.
    pub const FEET_PER_METRE: f64 = 3.28084;
    /// Sea-level standard atmosphere (psi).
    pub const SEA_LEVEL_PSI: f64 = 14.7;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::FEET_PER_METRE;

    /// Convert metres per second to feet per second.
    #[inline]
    pub fn ms_to_fts(v: f64) -> f64 {
        v * FEET_PER_METRE
    }

    /// Convert pounds-force to newtons.
    #[inline]
    pub fn lbf_to_n(v: f64) -> f64 {
        v * 4.448_221_615_260_5
    }
}

/// Rocket performance relations shared by the sizing and thrust paths.
pub mod relations {
    use super::constants::GC_LBM_FT_LBF_S2;
    use super::units::ms_to_fts;

    /// Thrust from the chamber-pressure form of the thrust equation, `F = Cf · Pc · At`.
    #[inline]
    pub fn thrust_lbf(
        thrust_coefficient: f64,
        chamber_pressure_psi: f64,
        throat_area_in2: f64,
    ) -> f64 {
        thrust_coefficient * chamber_pressure_psi * throat_area_in2
    }

    /// Throat area that produces `thrust_lbf` at the given `Cf` and `Pc`.
    #[inline]
    pub fn throat_area_in2(
        thrust_lbf: f64,
        thrust_coefficient: f64,
        chamber_pressure_psi: f64,
    ) -> f64 {
        thrust_lbf / (thrust_coefficient * chamber_pressure_psi)
    }

    /// Chamber pressure implied by a propellant flow through a choked throat,
    /// `Pc = ṁ · C* / (gc · At)` with `C*` supplied in m/s.
    #[inline]
    pub fn implied_chamber_pressure_psi(
        mass_flow_lbm_s: f64,
        cstar_m_s: f64,
        throat_area_in2: f64,
    ) -> f64 {
        (mass_flow_lbm_s * ms_to_fts(cstar_m_s)) / (GC_LBM_FT_LBF_S2 * throat_area_in2)
    }
}

#[cfg(test)]
mod tests {
    use super::relations::*;
    use super::units::*;

    #[test]
    fn velocity_converts_to_feet_per_second() {
        let v = 1_500.0;
        assert!((ms_to_fts(v) / 3.28084 - v).abs() < 1e-9);
        assert!((ms_to_fts(1.0) - 3.28084).abs() < 1e-12);
    }

    #[test]
    fn throat_area_inverts_thrust_equation() {
        let at = throat_area_in2(5_000.0, 1.6, 500.0);
        assert!((thrust_lbf(1.6, 500.0, at) - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn implied_pressure_scales_with_flow() {
        let p1 = implied_chamber_pressure_psi(10.0, 1_500.0, 5.0);
        let p2 = implied_chamber_pressure_psi(20.0, 1_500.0, 5.0);
        assert!((p2 - 2.0 * p1).abs() < 1e-9);
        assert!((p1 - 10.0 * 1_500.0 * 3.28084 / (32.174 * 5.0)).abs() < 1e-9);
    }
}
