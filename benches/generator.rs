// Generator and result-path benchmarks.
//
// Run with: cargo bench
//
// | Operation           | Target     | Description                         |
// |---------------------|------------|-------------------------------------|
// | Generate (1 MB)     | < 20ms     | In-memory sink, seeded rng          |
// | Generate (10 MB)    | < 200ms    | In-memory sink, seeded rng          |
// | Scrape stdout       | < 1us      | Both tokens from a typical line     |
// | Format CSV row      | < 1us      | One record, no escaping             |

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use xmlbench::generator::{generate, target_bytes};
use xmlbench::model::TimingRecord;
use xmlbench::report::csv::format_record_row;
use xmlbench::runner::contract::scrape_stdout;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);

    for size_mb in [1_u64, 10] {
        group.throughput(Throughput::Bytes(target_bytes(size_mb)));
        group.bench_with_input(BenchmarkId::from_parameter(size_mb), &size_mb, |b, &mb| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                let mut sink = io::sink();
                generate(&mut sink, black_box(mb), &mut rng).expect("generate")
            });
        });
    }

    group.finish();
}

fn bench_scrape(c: &mut Criterion) {
    let stdout = "loading data_100mb.xml\npugixml: read=1234ms write=567ms\n";
    c.bench_function("scrape_stdout", |b| {
        b.iter(|| scrape_stdout(black_box(stdout)));
    });
}

fn bench_format_row(c: &mut Criterion) {
    let record = TimingRecord::new("pugixml_test", "data_100mb.xml", 3, Some(1234), Some(567));
    c.bench_function("format_record_row", |b| {
        b.iter(|| format_record_row(black_box(&record)));
    });
}

criterion_group!(generator_benches, bench_generate);
criterion_group!(result_benches, bench_scrape, bench_format_row);
criterion_main!(generator_benches, result_benches);
