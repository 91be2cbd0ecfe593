//! Property-based tests for dataset generation and the CSV sink.
//!
//! Uses proptest to verify that:
//! - Generated documents meet the size lower bound
//! - Entry ids are contiguous from 0
//! - Any seed yields a well-formed document
//! - CSV rows survive arbitrary subject and dataset names

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;
use tracing::info;
use xmlbench::TimingRecord;
use xmlbench::generator::{generate, stop_threshold};
use xmlbench::report::{CsvSink, ResultSink, read_results};

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn entry_ids(doc: &str) -> Vec<u64> {
    doc.match_indices("<entry id=\"")
        .map(|(pos, marker)| {
            let rest = &doc[pos + marker.len()..];
            let end = rest.find('"').expect("closing quote");
            rest[..end].parse().expect("numeric id")
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 16,
        ..Default::default()
    })]

    /// Property: any seed produces a document past the stop threshold with ids 0..n.
    #[test]
    fn generated_document_is_complete(seed in any::<u64>()) {
        init_test_logging();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Vec::new();
        let summary = generate(&mut out, 1, &mut rng).unwrap();
        info!("proptest_generator: seed={seed} entries={}", summary.entries);

        prop_assert_eq!(summary.bytes, out.len() as u64);
        prop_assert!(summary.bytes >= stop_threshold(1));

        let doc = String::from_utf8(out).unwrap();
        let ids = entry_ids(&doc);
        prop_assert_eq!(ids.len() as u64, summary.entries);
        prop_assert!(ids.iter().enumerate().all(|(i, id)| *id == i as u64));
        prop_assert!(doc.ends_with("</root>\n"));
        prop_assert_eq!(doc.matches("<entry ").count(), doc.matches("</entry>").count());
    }

    /// Property: records with arbitrary names read back unchanged.
    #[test]
    fn csv_rows_survive_arbitrary_names(
        subject in "[a-zA-Z0-9_ ,\"-]{1,20}",
        dataset in "[a-zA-Z0-9_. ,\"/-]{1,40}",
        read in proptest::option::of(0u64..1_000_000),
        write in proptest::option::of(0u64..1_000_000),
    ) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");
        let record = TimingRecord::new(subject, dataset, 1, read, write);

        let mut sink = CsvSink::create(&path).unwrap();
        sink.record(&record).unwrap();
        prop_assert_eq!(read_results(&path).unwrap(), vec![record]);
    }
}
