//! Reference subject built on `quick-xml`.
//!
//! Loads the whole document into memory as owned events, then writes it back
//! out. Load time and save time are measured separately and reported through
//! both output channels the orchestrator understands.

use crate::runner::contract::Summary;
use anyhow::{Context, Result, bail};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Name printed in the subject's stdout line.
pub const SUBJECT_NAME: &str = "quickxml";

/// A fully loaded document.
#[derive(Debug, Default)]
pub struct Document {
    events: Vec<Event<'static>>,
    elements: usize,
}

impl Document {
    /// Number of elements (start and empty tags).
    #[must_use]
    pub const fn element_count(&self) -> usize {
        self.elements
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Parse `path` into memory, rejecting malformed documents.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not well-formed XML.
pub fn load_document(path: &Path) -> Result<Document> {
    let mut reader =
        Reader::from_file(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut buf = Vec::new();
    let mut doc = Document::default();
    let mut depth: usize = 0;
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("parse error at byte {}", reader.buffer_position()))?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => {
                if depth == 0 && seen_root {
                    bail!("multiple root elements");
                }
                depth += 1;
                seen_root = true;
                doc.elements += 1;
            }
            Event::Empty(_) => {
                if depth == 0 && seen_root {
                    bail!("multiple root elements");
                }
                seen_root = true;
                doc.elements += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        doc.events.push(event.into_owned());
        buf.clear();
    }

    if depth != 0 {
        bail!("unexpected end of document: {depth} unclosed element(s)");
    }
    if !seen_root {
        bail!("document has no root element");
    }
    debug!(elements = doc.elements, events = doc.events.len(), "Document loaded");
    Ok(doc)
}

/// Serialize `doc` to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_document(doc: &Document, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = Writer::new(BufWriter::new(file));
    for event in &doc.events {
        writer.write_event(event.borrow())?;
    }
    writer.into_inner().flush()?;
    Ok(())
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Load `input`, save to `output`, and return both durations.
///
/// # Errors
///
/// Returns an error if loading or saving fails.
pub fn run(input: &Path, output: &Path) -> Result<Summary> {
    let start = Instant::now();
    let doc = load_document(input)?;
    let read_ms = millis(start.elapsed());

    let start = Instant::now();
    save_document(&doc, output)?;
    let write_ms = millis(start.elapsed());

    Ok(Summary::new(read_ms, write_ms))
}

/// The stdout line carrying both timing tokens.
#[must_use]
pub fn format_report(summary: &Summary) -> String {
    format!(
        "{SUBJECT_NAME}: read={}ms write={}ms",
        summary.read_ms.unwrap_or_default(),
        summary.write_ms.unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::contract::scrape_stdout;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = concat!(
        "<?xml version=\"1.0\"?>\n",
        "<root>\n",
        "  <entry id=\"0\">\n",
        "    <name>a b</name>\n",
        "    <value>7</value>\n",
        "  </entry>\n",
        "  <empty/>\n",
        "</root>\n",
    );

    #[test]
    fn test_load_counts_elements() {
        let temp = TempDir::new().expect("temp dir");
        let input = temp.path().join("in.xml");
        fs::write(&input, SAMPLE).unwrap();

        let doc = load_document(&input).unwrap();
        assert_eq!(doc.element_count(), 5);
        assert!(doc.event_count() > doc.element_count());
    }

    #[test]
    fn test_save_reproduces_document() {
        let temp = TempDir::new().expect("temp dir");
        let input = temp.path().join("in.xml");
        let output = temp.path().join("out.xml");
        fs::write(&input, SAMPLE).unwrap();

        let summary = run(&input, &output).unwrap();
        assert!(summary.read_ms.is_some());
        assert!(summary.write_ms.is_some());
        assert_eq!(fs::read_to_string(&output).unwrap(), SAMPLE);
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        let temp = TempDir::new().expect("temp dir");
        let input = temp.path().join("bad.xml");
        fs::write(&input, "<root><a></b></root>").unwrap();
        assert!(load_document(&input).is_err());
    }

    #[test]
    fn test_rejects_truncated_document() {
        let temp = TempDir::new().expect("temp dir");
        let input = temp.path().join("bad.xml");
        fs::write(&input, "<root><a>text</a>").unwrap();
        assert!(load_document(&input).is_err());
    }

    #[test]
    fn test_rejects_empty_document() {
        let temp = TempDir::new().expect("temp dir");
        let input = temp.path().join("empty.xml");
        fs::write(&input, "").unwrap();
        assert!(load_document(&input).is_err());
    }

    #[test]
    fn test_missing_input() {
        let temp = TempDir::new().expect("temp dir");
        let err = run(&temp.path().join("nope.xml"), &temp.path().join("out.xml")).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }

    #[test]
    fn test_report_line_is_scrapeable() {
        let line = format_report(&Summary::new(12, 34));
        assert_eq!(line, "quickxml: read=12ms write=34ms");
        assert_eq!(scrape_stdout(&line), Summary::new(12, 34));
    }
}
