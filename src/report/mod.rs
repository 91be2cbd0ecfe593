//! Result aggregation.
//!
//! Every [`TimingRecord`] is persisted as soon as it exists: the CSV sink
//! writes one row, flushes, and syncs it to disk before control returns to
//! the orchestrator. At most the record in flight can be lost on a crash.

pub mod csv;

use crate::error::Result;
use crate::model::TimingRecord;
use std::io::{self, Write};

pub use self::csv::{CsvSink, HEADER_FIELDS, read_results};

/// Destination for timing records.
pub trait ResultSink {
    /// Durably store one record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the record could not be stored.
    fn record(&mut self, record: &TimingRecord) -> Result<()>;
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<TimingRecord>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, record: &TimingRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn record(&mut self, record: &TimingRecord) -> Result<()> {
        (**self).record(record)
    }
}

/// Human-readable line mirrored to the console for each record.
#[must_use]
pub fn format_console_line(record: &TimingRecord) -> String {
    format!(
        "[{}] run {}: read={}ms write={}ms",
        record.subject,
        record.run,
        record.read_or_sentinel(),
        record.write_or_sentinel()
    )
}

/// Header printed before the runs of one (dataset, subject) pair.
#[must_use]
pub fn format_cell_header(subject: &str, dataset: &str, runs: u32) -> String {
    format!("=== {subject} on {dataset} ({runs} runs) ===")
}

/// Owns the sink for the lifetime of a run and mirrors records to the console.
pub struct Aggregator<S: ResultSink> {
    sink: S,
    console: Option<Box<dyn Write>>,
}

impl<S: ResultSink> Aggregator<S> {
    /// Aggregator that mirrors to stdout when `console` is set.
    #[must_use]
    pub fn new(sink: S, console: bool) -> Self {
        let console: Option<Box<dyn Write>> = if console {
            Some(Box::new(io::stdout()))
        } else {
            None
        };
        Self { sink, console }
    }

    /// Aggregator mirroring to an arbitrary writer.
    #[must_use]
    pub fn with_writer(sink: S, writer: Box<dyn Write>) -> Self {
        Self {
            sink,
            console: Some(writer),
        }
    }

    /// Announce a new (dataset, subject) pair.
    pub fn begin_pair(&mut self, subject: &str, dataset: &str, runs: u32) {
        self.mirror(&format!("\n{}", format_cell_header(subject, dataset, runs)));
    }

    /// Persist one record, then mirror it.
    ///
    /// # Errors
    ///
    /// Returns the sink's persistence error; the record is not mirrored then.
    pub fn accept(&mut self, record: &TimingRecord) -> Result<()> {
        self.sink.record(record)?;
        self.mirror(&format_console_line(record));
        Ok(())
    }

    /// Write a free-form line to the console, if mirroring.
    pub fn mirror(&mut self, line: &str) {
        if let Some(out) = self.console.as_mut() {
            // Console output is cosmetic; a closed stdout must not stop the run.
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }

    #[cfg(test)]
    pub(crate) fn into_sink(self) -> S {
        self.sink
    }
}
