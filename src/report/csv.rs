//! CSV result sink.
//!
//! One header row, then one row per record:
//! `subject,dataset,run,read_ms,write_ms`, with `-1` for unknown timings.
//! Fields containing commas, quotes, or newlines are quoted.

use super::ResultSink;
use crate::error::{BenchError, Result};
use crate::model::{TimingRecord, from_sentinel};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names, in order.
pub const HEADER_FIELDS: &[&str] = &["subject", "dataset", "run", "read_ms", "write_ms"];

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Format a record as one CSV line, newline included.
#[must_use]
pub fn format_record_row(record: &TimingRecord) -> String {
    format!(
        "{},{},{},{},{}\n",
        escape_field(&record.subject),
        escape_field(&record.dataset),
        record.run,
        record.read_or_sentinel(),
        record.write_or_sentinel()
    )
}

/// File-backed sink; each row is synced before `record` returns.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: File,
}

impl CsvSink {
    /// Create or truncate `path` and write the header row.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Persistence`] if the file cannot be created or written.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| BenchError::persistence(path, e))?;
        let mut sink = Self {
            path: path.to_path_buf(),
            file,
        };
        let header = format!("{}\n", HEADER_FIELDS.join(","));
        sink.write_durably(header.as_bytes())?;
        debug!(path = %path.display(), "Result sink opened");
        Ok(sink)
    }

    fn write_durably(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .and_then(|()| self.file.flush())
            .and_then(|()| self.file.sync_data())
            .map_err(|e| BenchError::persistence(&self.path, e))
    }
}

impl ResultSink for CsvSink {
    fn record(&mut self, record: &TimingRecord) -> Result<()> {
        // One write per row keeps a crash from leaving half a row behind a
        // completed one.
        let row = format_record_row(record);
        self.write_durably(row.as_bytes())
    }
}

/// Split CSV text into rows of unescaped fields.
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Read a results file back into records.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the header is wrong, or a
/// row is malformed.
pub fn read_results(path: &Path) -> Result<Vec<TimingRecord>> {
    let text = fs::read_to_string(path)?;
    let mut rows = parse_rows(&text).into_iter();

    let header = rows.next().unwrap_or_default();
    if header != HEADER_FIELDS {
        return Err(BenchError::Config(format!(
            "unexpected results header in {}: {header:?}",
            path.display()
        )));
    }

    rows.enumerate()
        .map(|(idx, fields)| parse_record(&fields).ok_or_else(|| {
            BenchError::Config(format!(
                "malformed results row {} in {}: {fields:?}",
                idx + 2,
                path.display()
            ))
        }))
        .collect()
}

fn parse_record(fields: &[String]) -> Option<TimingRecord> {
    let [subject, dataset, run, read, write] = fields else {
        return None;
    };
    Some(TimingRecord::new(
        subject.clone(),
        dataset.clone(),
        run.parse().ok()?,
        from_sentinel(read.parse().ok()?),
        from_sentinel(write.parse().ok()?),
    ))
}
