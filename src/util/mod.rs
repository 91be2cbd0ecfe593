//! Shared utilities for `xmlbench`.
//!
//! - Progress indicators (dataset generation)
//! - Executable path helpers

pub mod progress;

use std::env;
use std::path::{Path, PathBuf};

/// Append the platform executable suffix (`.exe` on Windows) when missing.
#[must_use]
pub fn with_exe_suffix(name: &str) -> String {
    let suffix = env::consts::EXE_SUFFIX;
    if suffix.is_empty() || name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Look for `name` next to the running executable.
///
/// Returns `None` if the current executable path is unknown or the sibling
/// does not exist.
#[must_use]
pub fn sibling_executable(name: &str) -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let dir = exe.parent()?;
    let candidate = dir.join(with_exe_suffix(name));
    candidate.is_file().then_some(candidate)
}

/// Size of a file in whole megabytes (truncating), or `None` if unreadable.
#[must_use]
pub fn file_size_mb(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .map(|m| m.len() / crate::model::BYTES_PER_MB)
}
