//! Core data types for `xmlbench`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Dataset` - An XML input file, generated to a size or user-supplied
//! - `Subject` - An external program under test
//! - `TimingRecord` - One measured (dataset, subject, run) cell
//! - `CellOutcome` - How a subject invocation ended

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Value written in place of a duration that could not be determined.
pub const SENTINEL_MS: i64 = -1;

/// Bytes in one megabyte as used for dataset sizing.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// A named XML input file.
///
/// `size_mb == 0` marks a pre-existing file whose size is not managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub path: PathBuf,
    #[serde(default)]
    pub size_mb: u64,
}

impl Dataset {
    /// A dataset the generator materializes on demand.
    #[must_use]
    pub fn generated(path: impl Into<PathBuf>, size_mb: u64) -> Self {
        Self {
            path: path.into(),
            size_mb,
        }
    }

    /// A user-supplied dataset that must already exist.
    #[must_use]
    pub fn custom(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size_mb: 0,
        }
    }

    /// Whether the system owns this file's lifecycle (generates it when absent).
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.size_mb > 0
    }

    /// Identifier used in result rows.
    #[must_use]
    pub fn id(&self) -> String {
        self.path.display().to_string()
    }
}

/// An external program under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub program: PathBuf,
}

impl Subject {
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }

    /// Build a subject from a program path, naming it after the file stem.
    #[must_use]
    pub fn from_program(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = stem_of(&program);
        Self { name, program }
    }

    /// The name with every character outside `[A-Za-z0-9._-]` replaced by `_`,
    /// for use in file names.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Subject {
    type Err = crate::error::BenchError;

    /// Accepts `name=path` or a bare `path`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(crate::error::BenchError::invalid_argument(
                "subject",
                "empty subject specification",
            ));
        }
        match s.split_once('=') {
            Some((name, program)) if !name.trim().is_empty() && !program.trim().is_empty() => {
                Ok(Self::new(name.trim(), program.trim()))
            }
            Some(_) => Err(crate::error::BenchError::invalid_argument(
                "subject",
                format!("expected name=path, got '{s}'"),
            )),
            None => Ok(Self::from_program(s)),
        }
    }
}

/// How one subject invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOutcome {
    /// Exited 0 and reported both timings.
    Measured,
    /// Exited 0 but at least one timing token was missing.
    ContractViolation,
    /// Exited non-zero (or was killed by a signal); its timings are discarded.
    SubjectFailed,
    /// Could not be spawned.
    LaunchFailed,
    /// Killed after exceeding the configured timeout.
    TimedOut,
}

impl CellOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Measured => "measured",
            Self::ContractViolation => "contract_violation",
            Self::SubjectFailed => "subject_failed",
            Self::LaunchFailed => "launch_failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for CellOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the result table. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub subject: String,
    pub dataset: String,
    /// 1-based repetition index.
    pub run: u32,
    pub read_ms: Option<u64>,
    pub write_ms: Option<u64>,
}

impl TimingRecord {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        dataset: impl Into<String>,
        run: u32,
        read_ms: Option<u64>,
        write_ms: Option<u64>,
    ) -> Self {
        Self {
            subject: subject.into(),
            dataset: dataset.into(),
            run,
            read_ms,
            write_ms,
        }
    }

    /// Record for a cell whose subject never produced any timing.
    #[must_use]
    pub fn failed(subject: impl Into<String>, dataset: impl Into<String>, run: u32) -> Self {
        Self::new(subject, dataset, run, None, None)
    }

    #[must_use]
    pub fn read_or_sentinel(&self) -> i64 {
        to_sentinel(self.read_ms)
    }

    #[must_use]
    pub fn write_or_sentinel(&self) -> i64 {
        to_sentinel(self.write_ms)
    }

    /// Whether both timings are known.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.read_ms.is_some() && self.write_ms.is_some()
    }
}

/// Render an optional duration with `-1` standing in for "unknown".
#[must_use]
pub fn to_sentinel(value: Option<u64>) -> i64 {
    value.map_or(SENTINEL_MS, |ms| i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Inverse of [`to_sentinel`]: negative values mean "unknown".
#[must_use]
pub fn from_sentinel(value: i64) -> Option<u64> {
    u64::try_from(value).ok()
}
