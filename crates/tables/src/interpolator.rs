//! Trilinear interpolation over a rectangular (Pc, O/F, Pa) performance grid.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use crate::TableError;
use crate::axis::Axis;
use crate::parse::read_entries;
use crate::record::{PerformanceRecord, TableEntry};

/// Inclusive coordinate range covered by a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableBounds {
    pub chamber_pressure_psi: (f64, f64),
    pub mixture_ratio: (f64, f64),
    pub ambient_pressure_psi: (f64, f64),
}

/// Loaded table state. Never mutated once built.
#[derive(Debug, Clone)]
struct Grid {
    entries: Vec<TableEntry>,
    /// Axes in (Pc, O/F, Pa) order.
    axes: [Axis; 3],
    /// Axis positions of a cell to the entry stored there.
    index: HashMap<[usize; 3], usize>,
}

impl Grid {
    fn build(entries: Vec<TableEntry>) -> Self {
        let axes = [0, 1, 2].map(|d| Axis::from_values(entries.iter().map(|e| e.coordinates()[d])));

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let coords = entry.coordinates();
            // every coordinate came from these same entries, so lookups always hit
            let cell = [0, 1, 2].map(|d| axes[d].position(coords[d]).unwrap_or_default());
            if index.insert(cell, i).is_some() {
                debug!(
                    "duplicate table entry at Pc={}, O/F={}, Pa={}; keeping the later row",
                    coords[0], coords[1], coords[2]
                );
            }
        }

        let expected: usize = axes.iter().map(Axis::len).product();
        if index.len() < expected {
            warn!(
                "performance table is incomplete: {} of {} grid cells populated",
                index.len(),
                expected
            );
        }

        Self {
            entries,
            axes,
            index,
        }
    }

    fn cell(&self, pc: usize, of: usize, pa: usize) -> Option<&PerformanceRecord> {
        self.index
            .get(&[pc, of, pa])
            .map(|&i| &self.entries[i].performance)
    }
}

/// Performance table lookup engine.
///
/// A freshly constructed interpolator is not loaded and rejects every query.
/// Once loaded it is read-only, so it can be shared between threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TableInterpolator {
    grid: Option<Grid>,
}

impl TableInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let mut table = Self::new();
        table.load_path(path)?;
        Ok(table)
    }

    /// Load a table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut table = Self::new();
        table.load_reader(reader)?;
        Ok(table)
    }

    /// Build a table from entries already in memory.
    pub fn from_entries(entries: Vec<TableEntry>) -> Result<Self, TableError> {
        let mut table = Self::new();
        table.load_entries(entries)?;
        Ok(table)
    }

    /// Replace the current table with the contents of a CSV file.
    ///
    /// Returns the number of entries kept. On failure the interpolator is left unloaded.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, TableError> {
        self.grid = None;
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.load_reader(BufReader::new(file))?;
        info!("loaded {count} performance entries from {}", path.display());
        Ok(count)
    }

    /// Replace the current table with rows read from `reader`.
    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<usize, TableError> {
        self.grid = None;
        let entries = read_entries(reader)?;
        self.load_entries(entries)
    }

    /// Replace the current table with `entries`. Entries with non-finite coordinates are dropped.
    pub fn load_entries(&mut self, mut entries: Vec<TableEntry>) -> Result<usize, TableError> {
        self.grid = None;
        entries.retain(|e| e.coordinates().iter().all(|c| c.is_finite()));
        if entries.is_empty() {
            return Err(TableError::Empty);
        }

        let grid = Grid::build(entries);
        let count = grid.entries.len();
        debug!(
            "table axes: {} Pc x {} O/F x {} Pa",
            grid.axes[0].len(),
            grid.axes[1].len(),
            grid.axes[2].len()
        );
        self.grid = Some(grid);
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.grid.is_some()
    }

    /// Number of loaded entries (zero when unloaded).
    pub fn len(&self) -> usize {
        self.grid.as_ref().map_or(0, |g| g.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loaded entries in file order.
    pub fn entries(&self) -> &[TableEntry] {
        self.grid
            .as_ref()
            .map(|g| g.entries.as_slice())
            .unwrap_or_default()
    }

    /// Axes in (Pc, O/F, Pa) order.
    pub fn axes(&self) -> Option<&[Axis; 3]> {
        self.grid.as_ref().map(|g| &g.axes)
    }

    fn grid(&self) -> Result<&Grid, TableError> {
        self.grid.as_ref().ok_or(TableError::NotLoaded)
    }

    /// Inclusive range of each axis.
    pub fn bounds(&self) -> Result<TableBounds, TableError> {
        let grid = self.grid()?;
        let range = |axis: &Axis| -> Result<(f64, f64), TableError> {
            match (axis.min(), axis.max()) {
                (Some(lo), Some(hi)) => Ok((lo, hi)),
                _ => Err(TableError::NotLoaded),
            }
        };
        Ok(TableBounds {
            chamber_pressure_psi: range(&grid.axes[0])?,
            mixture_ratio: range(&grid.axes[1])?,
            ambient_pressure_psi: range(&grid.axes[2])?,
        })
    }

    /// Interpolate performance at chamber pressure `pc_psi`, mixture ratio `of` and
    /// ambient pressure `pa_psi`.
    ///
    /// Coordinates outside the table, infinities included, are clamped to its edges.
    /// If the interpolation cell has missing corners the record at the lowest corner
    /// is returned instead, which is only as accurate as the nearest grid point.
    pub fn query(
        &self,
        pc_psi: f64,
        of: f64,
        pa_psi: f64,
    ) -> Result<PerformanceRecord, TableError> {
        let grid = self.grid()?;
        let query = [pc_psi, of, pa_psi];
        if let Some(bad) = query.iter().find(|v| v.is_nan()) {
            return Err(TableError::InvalidCoordinate(*bad));
        }

        let [Some(x), Some(y), Some(z)] = [0, 1, 2].map(|d| grid.axes[d].bracket(query[d])) else {
            return Err(TableError::NotLoaded);
        };

        let corner = |i: usize, j: usize, k: usize| grid.cell(i, j, k);
        let c000 = corner(x.lower, y.lower, z.lower);
        let c001 = corner(x.lower, y.lower, z.upper);
        let c010 = corner(x.lower, y.upper, z.lower);
        let c011 = corner(x.lower, y.upper, z.upper);
        let c100 = corner(x.upper, y.lower, z.lower);
        let c101 = corner(x.upper, y.lower, z.upper);
        let c110 = corner(x.upper, y.upper, z.lower);
        let c111 = corner(x.upper, y.upper, z.upper);

        let (
            Some(c000),
            Some(c001),
            Some(c010),
            Some(c011),
            Some(c100),
            Some(c101),
            Some(c110),
            Some(c111),
        ) = (c000, c001, c010, c011, c100, c101, c110, c111)
        else {
            return match c000 {
                Some(nearest) => {
                    warn!(
                        "missing table corners around Pc={pc_psi}, O/F={of}, Pa={pa_psi}; \
                         using nearest grid point"
                    );
                    Ok(*nearest)
                }
                None => Err(TableError::MissingCoverage {
                    pc: x.lower,
                    of: y.lower,
                    pa: z.lower,
                }),
            };
        };

        Ok(trilinear(
            [c000, c001, c010, c011, c100, c101, c110, c111],
            [x.t, y.t, z.t],
        ))
    }
}

/// Blend eight corners (indexed `cPcOfPa`) along Pc, then O/F, then Pa.
fn trilinear(corners: [&PerformanceRecord; 8], t: [f64; 3]) -> PerformanceRecord {
    let [c000, c001, c010, c011, c100, c101, c110, c111] = corners;
    let [tx, ty, tz] = t;

    let c00 = PerformanceRecord::lerp(c000, c100, tx);
    let c01 = PerformanceRecord::lerp(c001, c101, tx);
    let c10 = PerformanceRecord::lerp(c010, c110, tx);
    let c11 = PerformanceRecord::lerp(c011, c111, tx);

    let c0 = PerformanceRecord::lerp(&c00, &c10, ty);
    let c1 = PerformanceRecord::lerp(&c01, &c11, ty);

    PerformanceRecord::lerp(&c0, &c1, tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cf: f64) -> PerformanceRecord {
        PerformanceRecord {
            thrust_coefficient: cf,
            cstar_m_s: 1_500.0,
            isp_s: 250.0,
            exit_velocity_m_s: 2_400.0,
            exit_pressure_psi: 5.0,
            gamma: 1.2,
        }
    }

    fn entry(pc: f64, of: f64, pa: f64, cf: f64) -> TableEntry {
        TableEntry {
            chamber_pressure_psi: pc,
            mixture_ratio: of,
            ambient_pressure_psi: pa,
            performance: record(cf),
        }
    }

    /// Cf = pc/100 + of + pa/10 on a 2x2x2 grid, which trilinear blending reproduces exactly.
    fn cube() -> TableInterpolator {
        let mut entries = Vec::new();
        for pc in [100.0, 200.0] {
            for of in [1.0, 2.0] {
                for pa in [0.0, 10.0] {
                    entries.push(entry(pc, of, pa, pc / 100.0 + of + pa / 10.0));
                }
            }
        }
        TableInterpolator::from_entries(entries).expect("cube loads")
    }

    #[test]
    fn unloaded_interpolator_rejects_queries() {
        let table = TableInterpolator::new();
        assert!(!table.is_loaded());
        assert!(matches!(table.query(1.0, 1.0, 1.0), Err(TableError::NotLoaded)));
        assert!(matches!(table.bounds(), Err(TableError::NotLoaded)));
    }

    #[test]
    fn interior_query_is_trilinear() {
        let cf = cube().query(150.0, 1.25, 5.0).unwrap().thrust_coefficient;
        assert!((cf - (1.5 + 1.25 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn bounds_cover_each_axis() {
        let b = cube().bounds().unwrap();
        assert_eq!(b.chamber_pressure_psi, (100.0, 200.0));
        assert_eq!(b.mixture_ratio, (1.0, 2.0));
        assert_eq!(b.ambient_pressure_psi, (0.0, 10.0));
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        for query in [[f64::NAN, 1.0, 0.0], [150.0, f64::NAN, 0.0], [150.0, 1.0, f64::NAN]] {
            assert!(matches!(
                cube().query(query[0], query[1], query[2]),
                Err(TableError::InvalidCoordinate(_))
            ));
        }
    }

    #[test]
    fn infinite_coordinates_clamp_to_the_edges() {
        let table = cube();
        let at = |pc, of, pa| table.query(pc, of, pa).unwrap();
        assert_eq!(at(f64::INFINITY, 1.5, 5.0), at(200.0, 1.5, 5.0));
        assert_eq!(at(f64::NEG_INFINITY, 1.5, 5.0), at(100.0, 1.5, 5.0));
        assert_eq!(at(150.0, f64::INFINITY, f64::NEG_INFINITY), at(150.0, 2.0, 0.0));
    }

    #[test]
    fn missing_corner_falls_back_to_lowest_corner() {
        let mut table = cube();
        let entries: Vec<_> = table
            .entries()
            .iter()
            .copied()
            .filter(|e| e.coordinates() != [200.0, 2.0, 10.0])
            .collect();
        table.load_entries(entries).unwrap();

        let fallback = table.query(150.0, 1.5, 5.0).unwrap();
        assert_eq!(fallback, record(1.0 + 1.0 + 0.0));
    }

    #[test]
    fn missing_lowest_corner_is_an_error() {
        let entries = vec![
            entry(200.0, 2.0, 10.0, 1.0),
            entry(100.0, 2.0, 10.0, 1.0),
            entry(200.0, 1.0, 0.0, 1.0),
        ];
        let table = TableInterpolator::from_entries(entries).unwrap();
        assert!(matches!(
            table.query(150.0, 1.5, 5.0),
            Err(TableError::MissingCoverage { pc: 0, of: 0, pa: 0 })
        ));
    }

    #[test]
    fn failed_reload_leaves_table_unloaded() {
        let mut table = cube();
        assert!(matches!(table.load_entries(Vec::new()), Err(TableError::Empty)));
        assert!(!table.is_loaded());
        assert!(table.query(150.0, 1.5, 5.0).is_err());
    }

    #[test]
    fn duplicate_coordinates_keep_the_later_row() {
        let entries = vec![entry(100.0, 1.0, 0.0, 1.0), entry(100.0, 1.0, 0.0, 3.0)];
        let table = TableInterpolator::from_entries(entries).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.query(100.0, 1.0, 0.0).unwrap().thrust_coefficient, 3.0);
    }

    #[test]
    fn loaded_table_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TableInterpolator>();
    }
}
