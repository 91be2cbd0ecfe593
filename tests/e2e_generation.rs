mod common;

use common::cli::{BenchWorkspace, QUICKXML, XMLGEN, run_program, run_xmlbench, run_xmlgen};
use std::fs;
use xmlbench::generator::{RESERVED_MARGIN, target_bytes};
use xmlbench::report::read_results;
use xmlbench::subject::load_document;

#[test]
fn e2e_xmlgen_writes_well_formed_document_of_requested_size() {
    let _log = common::test_log("e2e_xmlgen_writes_well_formed_document_of_requested_size");
    let workspace = BenchWorkspace::new();

    let run = run_xmlgen(&workspace, ["out.xml", "1", "--seed", "11"], "xmlgen_1mb");
    assert!(run.status.success(), "stderr: {}", run.stderr);
    assert!(run.stdout.contains("Generating out.xml (1 MB)"));
    assert!(run.stdout.contains("Generated out.xml ("));
    assert!(run.stdout.contains("entries, 1.00 MB)"), "stdout: {}", run.stdout);

    let len = fs::metadata(workspace.path("out.xml")).unwrap().len();
    assert!(len >= target_bytes(1) - RESERVED_MARGIN, "len {len}");
    assert!(len < target_bytes(1) + 1024, "len {len}");

    let doc = load_document(&workspace.path("out.xml")).unwrap();
    // root + 4 elements per entry
    assert_eq!((doc.element_count() - 1) % 4, 0);

    let text = workspace.read("out.xml");
    assert!(text.starts_with("<?xml version=\"1.0\"?>\n<root>\n"));
    assert!(text.ends_with("</root>\n"));
}

#[test]
fn e2e_xmlgen_seed_is_reproducible() {
    let _log = common::test_log("e2e_xmlgen_seed_is_reproducible");
    let workspace = BenchWorkspace::new();

    for name in ["a.xml", "b.xml"] {
        let run = run_xmlgen(&workspace, [name, "1", "--seed", "99"], name);
        assert!(run.status.success(), "stderr: {}", run.stderr);
    }
    assert_eq!(workspace.read("a.xml"), workspace.read("b.xml"));
}

#[test]
fn e2e_reference_subject_reports_both_timings() {
    let _log = common::test_log("e2e_reference_subject_reports_both_timings");
    let workspace = BenchWorkspace::new();
    workspace.write("in.xml", "<?xml version=\"1.0\"?>\n<root>\n  <a>b</a>\n</root>\n");

    let run = run_program(QUICKXML, &workspace, ["in.xml", "out.xml"], "quickxml_ok");
    assert!(run.status.success(), "stderr: {}", run.stderr);
    assert!(run.stdout.starts_with("quickxml: read="));
    assert!(run.stdout.contains("ms write="));
    assert_eq!(workspace.read("out.xml"), workspace.read("in.xml"));

    let usage = run_program(QUICKXML, &workspace, ["in.xml"], "quickxml_usage");
    assert_eq!(usage.code(), Some(1));

    workspace.write("broken.xml", "<root><a></root>");
    let broken = run_program(QUICKXML, &workspace, ["broken.xml", "o.xml"], "quickxml_broken");
    assert_eq!(broken.code(), Some(1));
    assert!(!broken.stdout.contains("read="));
}

#[test]
fn e2e_full_pipeline_generates_then_measures() {
    let _log = common::test_log("e2e_full_pipeline_generates_then_measures");
    let workspace = BenchWorkspace::new();
    workspace.write(
        "xmlbench.yaml",
        "datasets:\n  - path: gen_1mb.xml\n    size_mb: 1\n",
    );
    let subject = format!("quickxml={QUICKXML}");

    let run = run_xmlbench(
        &workspace,
        ["-a", "2", "--generator", XMLGEN, "--subject", subject.as_str()],
        "pipeline",
    );
    assert!(run.status.success(), "stderr: {}", run.stderr);
    assert!(run.stdout.contains("Generated gen_1mb.xml, size"), "stdout: {}", run.stdout);
    assert!(workspace.path("gen_1mb.xml").exists());

    let records = read_results(&workspace.path("results.csv")).unwrap();
    assert_eq!(records.len(), 2);
    for (idx, record) in records.iter().enumerate() {
        assert_eq!(record.subject, "quickxml");
        assert_eq!(record.dataset, "gen_1mb.xml");
        assert_eq!(record.run as usize, idx + 1);
        assert!(record.is_complete(), "record: {record:?}");
    }

    let generated = workspace.read("gen_1mb.xml");
    assert_eq!(workspace.read("temp_quickxml_1.xml"), generated);

    // A second run reuses the existing dataset.
    let again = run_xmlbench(
        &workspace,
        ["-a", "1", "--generator", XMLGEN, "--subject", subject.as_str()],
        "pipeline_again",
    );
    assert!(again.status.success(), "stderr: {}", again.stderr);
    assert!(!again.stdout.contains("Generating test file"));
    assert_eq!(workspace.read("gen_1mb.xml"), generated);
}
