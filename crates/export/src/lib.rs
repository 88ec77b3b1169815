//! Export helpers for CSV and JSON artifacts.

pub mod report {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    use csv::Writer;

    const HEADER: [&str; 13] = [
        "engine",
        "mode",
        "chamber_pressure_psi",
        "mixture_ratio",
        "ambient_pressure_psi",
        "total_flow_lbm_s",
        "thrust_lbf",
        "thrust_n",
        "cf",
        "cstar_m_s",
        "isp_s",
        "iterations",
        "converged",
    ];

    /// CSV report sink returned by [`report_writer`].
    pub type ReportWriter = Writer<Box<dyn Write>>;

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Open a CSV report at `path`; fields such as engine names are quoted as needed.
    pub fn report_writer(path: &Path) -> io::Result<ReportWriter> {
        Ok(Writer::from_writer(writer_for_path(path)?))
    }

    /// Write the operating-point report header.
    pub fn write_header<W: Write>(writer: &mut Writer<W>) -> csv::Result<()> {
        writer.write_record(HEADER)
    }

    /// How the chamber pressure of a row was obtained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Mode {
        /// Pc was given; mixture ratio came from the propellant flows.
        Injector,
        /// Pc was solved from the total propellant flow.
        MassFlow { iterations: usize, converged: bool },
    }

    /// CSV row for one evaluated operating point.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub engine: &'a str,
        pub mode: Mode,
        pub chamber_pressure_psi: f64,
        pub mixture_ratio: f64,
        pub ambient_pressure_psi: f64,
        pub total_flow_lbm_s: f64,
        pub thrust_lbf: f64,
        pub thrust_n: f64,
        pub cf: f64,
        pub cstar_m_s: f64,
        pub isp_s: f64,
    }

    impl Record<'_> {
        /// Serialize the record to CSV, matching the header ordering.
        pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> csv::Result<()> {
            let (mode, iterations, converged) = match self.mode {
                Mode::Injector => ("injector", String::new(), String::new()),
                Mode::MassFlow {
                    iterations,
                    converged,
                } => ("mass_flow", iterations.to_string(), converged.to_string()),
            };
            writer.write_record([
                self.engine.to_string(),
                mode.to_string(),
                format!("{:.3}", self.chamber_pressure_psi),
                format!("{:.4}", self.mixture_ratio),
                format!("{:.3}", self.ambient_pressure_psi),
                format!("{:.4}", self.total_flow_lbm_s),
                format!("{:.2}", self.thrust_lbf),
                format!("{:.2}", self.thrust_n),
                format!("{:.5}", self.cf),
                format!("{:.2}", self.cstar_m_s),
                format!("{:.2}", self.isp_s),
                iterations,
                converged,
            ])
        }
    }
}

pub mod summary {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    /// Per-run summary written next to the CSV report.
    #[derive(Debug, Clone, Serialize)]
    pub struct RunSummary {
        pub engine: String,
        pub table: String,
        pub table_entries: usize,
        pub throat_area_in2: f64,
        pub points_evaluated: usize,
        pub points_failed: usize,
        pub unconverged_solves: usize,
        pub max_thrust_lbf: Option<f64>,
        pub failures: Vec<PointFailure>,
        /// Set when the engine could not be set up; no points were evaluated.
        pub error: Option<String>,
    }

    /// An operating point that could not be evaluated.
    #[derive(Debug, Clone, Serialize)]
    pub struct PointFailure {
        pub index: usize,
        pub error: String,
    }

    /// Write a summary (or a list of them) as pretty-printed JSON, creating parent directories.
    pub fn write_summary_json<T: Serialize + ?Sized>(path: &Path, summary: &T) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::report::{Mode, Record, write_header};
    use super::summary::{RunSummary, write_summary_json};

    fn record(mode: Mode) -> Record<'static> {
        named_record("demo", mode)
    }

    fn named_record(engine: &'static str, mode: Mode) -> Record<'static> {
        Record {
            engine,
            mode,
            chamber_pressure_psi: 500.0,
            mixture_ratio: 2.0,
            ambient_pressure_psi: 14.7,
            total_flow_lbm_s: 15.0,
            thrust_lbf: 4_321.5,
            thrust_n: 19_223.0,
            cf: 1.571_45,
            cstar_m_s: 1_580.0,
            isp_s: 253.1,
        }
    }

    fn report(records: &[Record<'_>]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_header(&mut writer).unwrap();
        for record in records {
            record.write_to(&mut writer).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn rows_match_header_column_count() {
        let text = report(&[
            record(Mode::Injector),
            record(Mode::MassFlow {
                iterations: 6,
                converged: true,
            }),
        ]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let columns = lines[0].split(',').count();
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), columns, "{line}");
        }
        assert!(lines[1].starts_with("demo,injector,500.000,2.0000,14.700,"));
        assert!(lines[2].ends_with(",6,true"));
    }

    #[test]
    fn engine_names_with_separators_stay_in_one_column() {
        let text = report(&[
            named_record("Merlin, 1D", Mode::Injector),
            named_record("RS-25 \"SSME\"", Mode::Injector),
        ]);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let columns = reader.headers().unwrap().len();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), columns);
            assert_eq!(&row[1], "injector");
        }
        assert_eq!(&rows[0][0], "Merlin, 1D");
        assert_eq!(&rows[1][0], "RS-25 \"SSME\"");
    }

    #[test]
    fn summary_json_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/summary.json");
        let summary = RunSummary {
            engine: "demo".into(),
            table: "demo.csv".into(),
            table_entries: 8,
            throat_area_in2: 5.5,
            points_evaluated: 2,
            points_failed: 0,
            unconverged_solves: 0,
            max_thrust_lbf: Some(4_321.5),
            failures: Vec::new(),
            error: None,
        };
        write_summary_json(&path, &summary).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["engine"], "demo");
        assert_eq!(value["throat_area_in2"], 5.5);
    }
}
