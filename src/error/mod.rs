//! Error types and handling for `xmlbench`.
//!
//! Only run-terminating failures are errors here. A subject that crashes,
//! cannot be spawned, or omits a timing token is not an error: it becomes a
//! sentinel-valued `TimingRecord` and the matrix continues.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Every variant belongs to one [`ErrorCategory`]
//! - Provides recovery hints for user-facing errors

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `xmlbench` operations.
#[derive(Error, Debug)]
pub enum BenchError {
    // === Configuration Errors ===
    /// A command-line or config value is unusable.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The user-supplied dataset is not on disk.
    #[error("Custom dataset not found: {path}")]
    CustomDatasetMissing { path: PathBuf },

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === Generation Errors ===
    /// The generator ran but did not produce the dataset.
    #[error("Failed to generate dataset '{path}': {reason}")]
    Generation { path: PathBuf, reason: String },

    /// The generator program could not be started.
    #[error("Failed to launch generator '{program}': {source}")]
    GeneratorLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Persistence Errors ===
    /// The result sink could not be opened or written.
    #[error("Cannot write results to '{path}': {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure classes that terminate a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad CLI argument, bad config, missing custom dataset.
    Configuration,
    /// No valid fixture could be produced.
    Generation,
    /// Results can no longer be trusted to reach disk.
    Persistence,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Generation => "GENERATION_ERROR",
            Self::Persistence => "PERSISTENCE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl BenchError {
    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. }
            | Self::CustomDatasetMissing { .. }
            | Self::Config(_)
            | Self::Yaml(_) => ErrorCategory::Configuration,
            Self::Generation { .. } | Self::GeneratorLaunch { .. } => ErrorCategory::Generation,
            Self::Persistence { .. } => ErrorCategory::Persistence,
            Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CustomDatasetMissing { .. } => Some(
                "Check the path passed to --custom, or datasets without size_mb in xmlbench.yaml",
            ),
            Self::GeneratorLaunch { .. } => {
                Some("Build xmlgen or point --generator at the data generator binary")
            }
            Self::Persistence { .. } => Some("Check that the results path is writable"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    ///
    /// Every fatal failure exits with 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Create an invalid-argument error for a specific field.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a sink I/O failure.
    #[must_use]
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Render for stderr: message plus an optional hint line.
    #[must_use]
    pub fn to_human(&self) -> String {
        self.suggestion().map_or_else(
            || format!("error: {self}"),
            |hint| format!("error: {self}\n  hint: {hint}"),
        )
    }
}

/// Result type using `BenchError`.
pub type Result<T> = std::result::Result<T, BenchError>;
