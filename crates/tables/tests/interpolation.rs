use std::fs::File;
use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;
use thrust_tables::{PerformanceRecord, TableError, TableInterpolator};

const HEADER: &str = "Pc_psi,OF,Pa_psi,Cf,Cstar_ms,Isp_s,Ve_ms,Pe_psi,Gamma";
const PC: [f64; 4] = [100.0, 300.0, 600.0, 1_000.0];
const OF: [f64; 4] = [1.0, 1.5, 2.5, 3.5];
const PA: [f64; 3] = [0.0, 5.0, 14.7];

/// Smooth but non-linear synthetic performance surface.
fn performance(pc: f64, of: f64, pa: f64) -> PerformanceRecord {
    let cstar = 1_400.0 + 120.0 * of - 18.0 * of * of + 0.05 * pc;
    let cf = 1.45 + 0.0002 * pc - 0.012 * pa + 0.01 * of;
    PerformanceRecord {
        thrust_coefficient: cf,
        cstar_m_s: cstar,
        isp_s: cf * cstar / 9.80665,
        exit_velocity_m_s: 2_000.0 + 0.3 * pc + 50.0 * of,
        exit_pressure_psi: pc / 80.0,
        gamma: 1.25 - 0.01 * of,
    }
}

fn write_table(path: &Path) {
    let mut file = File::create(path).expect("create table");
    writeln!(file, "{HEADER}").unwrap();
    for pc in PC {
        for of in OF {
            for pa in PA {
                let p = performance(pc, of, pa);
                writeln!(
                    file,
                    "{pc},{of},{pa},{},{},{},{},{},{}",
                    p.thrust_coefficient,
                    p.cstar_m_s,
                    p.isp_s,
                    p.exit_velocity_m_s,
                    p.exit_pressure_psi,
                    p.gamma
                )
                .unwrap();
            }
        }
    }
}

fn load() -> TableInterpolator {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("table.csv");
    write_table(&path);
    TableInterpolator::from_path(&path).expect("table loads")
}

fn fields(p: &PerformanceRecord) -> [f64; 6] {
    [
        p.thrust_coefficient,
        p.cstar_m_s,
        p.isp_s,
        p.exit_velocity_m_s,
        p.exit_pressure_psi,
        p.gamma,
    ]
}

#[test]
fn grid_points_are_recovered_exactly() {
    let table = load();
    assert_eq!(table.len(), PC.len() * OF.len() * PA.len());
    for pc in PC {
        for of in OF {
            for pa in PA {
                let got = table.query(pc, of, pa).unwrap();
                let want = performance(pc, of, pa);
                for (g, w) in fields(&got).iter().zip(fields(&want)) {
                    assert_relative_eq!(*g, w, max_relative = 1e-12);
                }
            }
        }
    }
}

#[test]
fn queries_outside_the_table_clamp_to_the_edge() {
    let table = load();
    let pairs = [
        ((50.0, 2.0, 5.0), (100.0, 2.0, 5.0)),
        ((2_000.0, 2.0, 5.0), (1_000.0, 2.0, 5.0)),
        ((450.0, 0.2, 5.0), (450.0, 1.0, 5.0)),
        ((450.0, 9.0, 5.0), (450.0, 3.5, 5.0)),
        ((450.0, 2.0, -3.0), (450.0, 2.0, 0.0)),
        ((450.0, 2.0, 20.0), (450.0, 2.0, 14.7)),
    ];
    for ((pc, of, pa), (bpc, bof, bpa)) in pairs {
        let outside = table.query(pc, of, pa).unwrap();
        let edge = table.query(bpc, bof, bpa).unwrap();
        assert_eq!(outside, edge, "query ({pc}, {of}, {pa})");
    }
}

#[test]
fn blending_between_neighbours_does_not_overshoot() {
    let table = load();
    let (of, pa) = (1.5, 5.0);
    for window in PC.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        let a = fields(&table.query(lo, of, pa).unwrap());
        let b = fields(&table.query(hi, of, pa).unwrap());
        for step in 1..10 {
            let pc = lo + (hi - lo) * step as f64 / 10.0;
            let mid = fields(&table.query(pc, of, pa).unwrap());
            for i in 0..6 {
                let (min, max) = (a[i].min(b[i]), a[i].max(b[i]));
                assert!(
                    mid[i] >= min - 1e-9 && mid[i] <= max + 1e-9,
                    "field {i} at Pc={pc}: {} not in [{min}, {max}]",
                    mid[i]
                );
            }
        }
    }
}

#[test]
fn midpoint_on_one_axis_is_the_average() {
    let table = load();
    let mid = table.query(450.0, 2.5, 14.7).unwrap();
    let lo = table.query(300.0, 2.5, 14.7).unwrap();
    let hi = table.query(600.0, 2.5, 14.7).unwrap();
    assert_relative_eq!(
        mid.cstar_m_s,
        0.5 * (lo.cstar_m_s + hi.cstar_m_s),
        max_relative = 1e-12
    );
}

#[test]
fn bounds_report_axis_extents() {
    let bounds = load().bounds().unwrap();
    assert_eq!(bounds.chamber_pressure_psi, (100.0, 1_000.0));
    assert_eq!(bounds.mixture_ratio, (1.0, 3.5));
    assert_eq!(bounds.ambient_pressure_psi, (0.0, 14.7));
}

#[test]
fn header_only_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, format!("{HEADER}\n100,2,0,1.5\ngarbage\n")).unwrap();

    let mut table = TableInterpolator::new();
    assert!(matches!(table.load_path(&path), Err(TableError::Empty)));
    assert!(!table.is_loaded());
    assert!(matches!(
        table.query(100.0, 2.0, 0.0),
        Err(TableError::NotLoaded)
    ));
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    match TableInterpolator::from_path(&path) {
        Err(TableError::Open { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected open error, got {other:?}"),
    }
}

#[test]
fn reader_source_matches_file_source() {
    let body = format!(
        "{HEADER}\n100,1,0,1.5,1500,230,2200,1.2,1.2\n200,1,0,1.6,1510,240,2250,2.4,1.2\n"
    );
    let table = TableInterpolator::from_reader(body.as_bytes()).unwrap();
    assert_relative_eq!(
        table.query(150.0, 1.0, 0.0).unwrap().thrust_coefficient,
        1.55,
        max_relative = 1e-12
    );
}
