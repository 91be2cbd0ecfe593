//! Subject output contract.
//!
//! A subject reports its timings in one of two ways:
//!
//! 1. A JSON summary `{"read_ms":N,"write_ms":M}` written to the file named
//!    by the [`SUMMARY_ENV`] environment variable. This is the preferred
//!    channel: it is unaffected by whatever else the subject logs.
//! 2. Free-form stdout containing `read=<N>ms` and `write=<M>ms`.
//!
//! Each field is resolved independently: a summary value wins, otherwise the
//! stdout token is used, otherwise the field is unknown.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Environment variable carrying the summary file path to a subject.
pub const SUMMARY_ENV: &str = "XMLBENCH_SUMMARY";

pub const READ_MARKER: &str = "read=";
pub const WRITE_MARKER: &str = "write=";
pub const UNIT_MARKER: &str = "ms";

/// Machine-readable timing summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub read_ms: Option<u64>,
    #[serde(default)]
    pub write_ms: Option<u64>,
}

impl Summary {
    #[must_use]
    pub const fn new(read_ms: u64, write_ms: u64) -> Self {
        Self {
            read_ms: Some(read_ms),
            write_ms: Some(write_ms),
        }
    }

    /// Parse a summary document. Malformed input yields `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text.trim()).ok()
    }

    /// Read and parse a summary file; absent or malformed files yield `None`.
    #[must_use]
    pub fn read_from(path: &Path) -> Option<Self> {
        fs::read_to_string(path).ok().as_deref().and_then(Self::parse)
    }

    /// Write this summary to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// Write to the path in [`SUMMARY_ENV`], if the orchestrator set one.
    ///
    /// Returns `Ok(false)` when no summary channel was provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to_env_path(&self) -> io::Result<bool> {
        match std::env::var_os(SUMMARY_ENV) {
            Some(path) if !path.is_empty() => {
                self.write_to(Path::new(&path))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Extract the integer between `marker` and the next `ms` in `text`.
///
/// Only the first occurrence of `marker` is considered. The value is the
/// leading run of digits after optional whitespace and an optional `+`, so
/// `read=12.5ms` yields 12. Returns `None` when the marker is absent, no
/// digit leads, or the value is negative. When no `ms` follows, the rest of
/// the text is used.
#[must_use]
pub fn scrape_token(text: &str, marker: &str) -> Option<u64> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find(UNIT_MARKER).unwrap_or(rest.len());
    let value = rest[..end].trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let len = value.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    value[..len].parse().ok()
}

/// Scrape both timing tokens from captured stdout.
#[must_use]
pub fn scrape_stdout(stdout: &str) -> Summary {
    Summary {
        read_ms: scrape_token(stdout, READ_MARKER),
        write_ms: scrape_token(stdout, WRITE_MARKER),
    }
}

/// Combine the structured summary (if any) with stdout tokens, field by field.
#[must_use]
pub fn resolve(summary: Option<Summary>, stdout: &str) -> Summary {
    let scraped = scrape_stdout(stdout);
    let summary = summary.unwrap_or_default();
    Summary {
        read_ms: summary.read_ms.or(scraped.read_ms),
        write_ms: summary.write_ms.or(scraped.write_ms),
    }
}
