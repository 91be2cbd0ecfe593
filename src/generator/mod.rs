//! Synthetic XML dataset generation.
//!
//! Produces a well-formed document of roughly a requested size:
//!
//! ```text
//! <?xml version="1.0"?>
//! <root>
//!   <entry id="0">
//!     <name>...20 random chars...</name>
//!     <value>0..=10000</value>
//!     <description>...100 random chars...</description>
//!   </entry>
//!   ...
//! </root>
//! ```
//!
//! Entries are streamed one at a time; the whole document is never held in
//! memory. Generation stops once the running byte count reaches the target
//! minus [`RESERVED_MARGIN`], so the file size is a lower bound rather than
//! an exact target (the last entry is never trimmed).

use crate::error::{BenchError, Result};
use crate::model::BYTES_PER_MB;
use crate::util::progress::ProgressTracker;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Bytes held back from the target so the closing tag always fits.
pub const RESERVED_MARGIN: u64 = 100;
/// Length of the random `<name>` text.
pub const NAME_LEN: usize = 20;
/// Length of the random `<description>` text.
pub const DESCRIPTION_LEN: usize = 100;
/// Inclusive upper bound of `<value>`.
pub const MAX_VALUE: u32 = 10_000;
/// Progress is reported every this many entries.
pub const PROGRESS_EVERY: u64 = 1000;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";
const HEADER: &str = "<?xml version=\"1.0\"?>\n<root>\n";
const FOOTER: &str = "</root>\n";

/// What a generation pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Number of `<entry>` elements written.
    pub entries: u64,
    /// Total bytes written, declaration and closing tag included.
    pub bytes: u64,
}

impl GenerationSummary {
    #[must_use]
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / BYTES_PER_MB as f64
    }
}

/// Size in bytes requested for `size_mb`.
#[must_use]
pub const fn target_bytes(size_mb: u64) -> u64 {
    size_mb.saturating_mul(BYTES_PER_MB)
}

/// Entry bytes stop being appended once this count is reached.
#[must_use]
pub const fn stop_threshold(size_mb: u64) -> u64 {
    target_bytes(size_mb).saturating_sub(RESERVED_MARGIN)
}

fn push_random_text<R: Rng + ?Sized>(buf: &mut String, rng: &mut R, len: usize) {
    buf.extend((0..len).map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())])));
}

/// Serialize entry `id` into `buf`, replacing its contents.
fn format_entry<R: Rng + ?Sized>(buf: &mut String, id: u64, rng: &mut R) {
    buf.clear();
    let value = rng.random_range(0..=MAX_VALUE);
    let _ = write!(buf, "  <entry id=\"{id}\">\n    <name>");
    push_random_text(buf, rng, NAME_LEN);
    let _ = write!(buf, "</name>\n    <value>{value}</value>\n    <description>");
    push_random_text(buf, rng, DESCRIPTION_LEN);
    buf.push_str("</description>\n  </entry>\n");
}

/// Write a document of at least `size_mb` MB (minus the margin) to `out`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate<W: Write, R: Rng + ?Sized>(
    out: &mut W,
    size_mb: u64,
    rng: &mut R,
) -> io::Result<GenerationSummary> {
    generate_with_progress(out, size_mb, rng, |_, _| {})
}

/// Like [`generate`], calling `on_progress(entries, bytes)` every
/// [`PROGRESS_EVERY`] entries.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_with_progress<W, R, F>(
    out: &mut W,
    size_mb: u64,
    rng: &mut R,
    mut on_progress: F,
) -> io::Result<GenerationSummary>
where
    W: Write,
    R: Rng + ?Sized,
    F: FnMut(u64, u64),
{
    let threshold = stop_threshold(size_mb);

    out.write_all(HEADER.as_bytes())?;
    let mut written = HEADER.len() as u64;
    let mut entries: u64 = 0;
    let mut entry = String::with_capacity(256);

    while written < threshold {
        format_entry(&mut entry, entries, rng);
        out.write_all(entry.as_bytes())?;
        written += entry.len() as u64;

        if entries % PROGRESS_EVERY == 0 {
            on_progress(entries, written);
        }
        entries += 1;
    }

    out.write_all(FOOTER.as_bytes())?;
    written += FOOTER.len() as u64;
    out.flush()?;

    Ok(GenerationSummary {
        entries,
        bytes: written,
    })
}

/// Build the random source: fixed seed for reproducible output, OS entropy otherwise.
#[must_use]
pub fn make_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Generate a dataset file at `path`.
///
/// An existing file is truncated. A partially written file is left in place
/// on failure.
///
/// # Errors
///
/// Returns [`BenchError::Generation`] if the file cannot be created or written.
pub fn generate_file(path: &Path, size_mb: u64, seed: Option<u64>) -> Result<GenerationSummary> {
    let file = File::create(path).map_err(|e| BenchError::Generation {
        path: path.to_path_buf(),
        reason: format!("cannot open output file: {e}"),
    })?;
    let mut out = BufWriter::new(file);
    let mut rng = make_rng(seed);

    info!(path = %path.display(), size_mb, seeded = seed.is_some(), "Generating dataset");
    let progress = ProgressTracker::bytes(target_bytes(size_mb), &path.display().to_string());

    let summary = generate_with_progress(&mut out, size_mb, &mut rng, |entries, bytes| {
        progress.set_position(bytes);
        debug!(entries, bytes, "Generation progress");
    })
    .map_err(|e| BenchError::Generation {
        path: path.to_path_buf(),
        reason: format!("write failed: {e}"),
    })?;
    progress.finish_and_clear();

    info!(
        path = %path.display(),
        entries = summary.entries,
        bytes = summary.bytes,
        "Dataset generated"
    );
    Ok(summary)
}
