#![warn(missing_docs)]
//! CSV backend for [`strand_core::record::Recorder`].
//!
//! Writes one row per record into a tabular progress file, flushing after
//! every row so the log can be inspected while a run is in progress.
use anyhow::Result;
use log::warn;
use std::{fs::File, path::Path};
use strand_core::record::{Record, RecordValue, Recorder};

/// Writes records as rows of a CSV file.
///
/// The column set is fixed by the first record written: its keys are sorted
/// and become the header. Later records fill matching columns and leave
/// missing ones empty; keys that were not in the first record are dropped
/// with a warning. Array values are not representable in a tabular row and
/// are skipped.
pub struct CsvRecorder {
    wtr: csv::Writer<File>,
    columns: Option<Vec<String>>,
}

impl CsvRecorder {
    /// Constructs a [`CsvRecorder`] writing to the given file path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let wtr = csv::Writer::from_path(path)?;
        Ok(Self { wtr, columns: None })
    }

    fn format_value(v: &RecordValue) -> Option<String> {
        match v {
            RecordValue::Scalar(v) => Some(format!("{}", v)),
            RecordValue::DateTime(t) => Some(t.to_rfc3339()),
            RecordValue::String(s) => Some(s.clone()),
            RecordValue::Array1(_) => None,
        }
    }
}

impl Recorder for CsvRecorder {
    /// Writes a record as one CSV row, flushed immediately.
    fn write(&mut self, record: Record) {
        if self.columns.is_none() {
            let mut columns: Vec<String> = record
                .iter()
                .filter(|(_, v)| Self::format_value(v).is_some())
                .map(|(k, _)| k.clone())
                .collect();
            columns.sort();
            if let Err(e) = self.wtr.write_record(&columns) {
                warn!("Failed to write CSV header: {}", e);
                return;
            }
            self.columns = Some(columns);
        }

        let columns = self.columns.as_ref().unwrap();
        for key in record.keys() {
            if !columns.contains(key) {
                warn!("Dropping '{}': not in the header row", key);
            }
        }
        let row: Vec<String> = columns
            .iter()
            .map(|k| {
                record
                    .get(k)
                    .and_then(Self::format_value)
                    .unwrap_or_default()
            })
            .collect();
        if let Err(e) = self.wtr.write_record(&row) {
            warn!("Failed to write CSV row: {}", e);
        }
        self.flush();
    }

    fn flush(&mut self) {
        if let Err(e) = self.wtr.flush() {
            warn!("Failed to flush CSV writer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_writes_header_and_rows() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("progress.csv");
        let mut recorder = CsvRecorder::new(&path)?;

        let mut r1 = Record::from_scalar("mean_rew", 1.5);
        r1.insert("iteration", RecordValue::Scalar(1.0));
        r1.insert("curve", RecordValue::Array1(vec![0.1, 0.2]));
        recorder.write(r1);

        let mut r2 = Record::from_scalar("mean_rew", 2.5);
        r2.insert("iteration", RecordValue::Scalar(2.0));
        recorder.write(r2);

        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "iteration,mean_rew");
        assert_eq!(lines[1], "1,1.5");
        assert_eq!(lines[2], "2,2.5");
        Ok(())
    }

    #[test]
    fn test_missing_column_left_empty() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("progress.csv");
        let mut recorder = CsvRecorder::new(&path)?;

        let mut r1 = Record::from_scalar("a", 1.0);
        r1.insert("b", RecordValue::Scalar(2.0));
        recorder.write(r1);
        recorder.write(Record::from_scalar("a", 3.0));

        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "a,b");
        assert_eq!(lines[2], "3,");
        Ok(())
    }
}
