//! Reads participant lists from CSV.
//!
//! The file has two columns, account and amount, taken by position. The first row is a header
//! and is skipped.

use std::{fs::File, io, path::Path};

use crate::types::{ParticipantRecord, common::CsvRow};

pub fn read_participants<R: io::Read>(reader: R) -> Result<Vec<ParticipantRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row: CsvRow = record.deserialize(None)?;
        records.push(ParticipantRecord::from_csv_row(line, row));
    }
    Ok(records)
}

pub fn read_participants_from_path(
    path: impl AsRef<Path>,
) -> Result<Vec<ParticipantRecord>, csv::Error> {
    let file = File::open(path)?;
    read_participants(io::BufReader::new(file))
}
