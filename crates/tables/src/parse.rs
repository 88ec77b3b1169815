//! Row-level parsing of performance table files.
//!
//! Files have one header line followed by comma-separated records
//! `Pc,OF,Pa,Cf,Cstar,Isp,Ve,Pe,Gamma`. Rows that do not yield nine numeric
//! fields are dropped rather than failing the load.

use std::io::Read;

use csv::{ByteRecord, ReaderBuilder, Trim};
use log::debug;

use crate::TableError;
use crate::record::{FIELDS_PER_ROW, TableEntry};

/// Read every well-formed entry from a table source.
pub(crate) fn read_entries<R: Read>(reader: R) -> Result<Vec<TableEntry>, TableError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        match parse_row(&record) {
            Some(row) => entries.push(TableEntry::from_row(&row)),
            None => {
                skipped += 1;
                debug!(
                    "skipping malformed table row at line {}",
                    record.position().map(|p| p.line()).unwrap_or_default()
                );
            }
        }
    }

    if skipped > 0 {
        debug!("dropped {skipped} malformed row(s), kept {}", entries.len());
    }
    Ok(entries)
}

/// Take the first nine fields with a finite numeric prefix, ignoring the rest.
fn parse_row(record: &ByteRecord) -> Option<[f64; FIELDS_PER_ROW]> {
    let mut row = [0.0; FIELDS_PER_ROW];
    let mut filled = 0;
    for value in record.iter().filter_map(parse_field) {
        row[filled] = value;
        filled += 1;
        if filled == FIELDS_PER_ROW {
            return Some(row);
        }
    }
    None
}

/// Longest leading number in a token, so `100 psi` reads as 100.
fn parse_field(field: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(field).ok()?.trim_start();
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
