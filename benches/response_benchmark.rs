use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use node_booking::request::NodeRequirements;
use node_booking::response::{all_fields, first_field, INT_FIELD_TAG};

fn active_bookings_xml(count: usize) -> String {
    let ids: String = (0..count).map(|i| format!("<int>{}</int>", i)).collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><ArrayOfInt xmlns="http://slicify.com/">{}</ArrayOfInt>"#,
        ids
    )
}

// Benchmark for decoding service replies
pub fn response_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_reply_decoding");

    let status_xml =
        r#"<?xml version="1.0" encoding="utf-8"?><string xmlns="http://slicify.com/">Ready</string>"#;
    group.bench_function("first_field", |b| {
        b.iter(|| first_field(black_box(status_xml)))
    });

    for count in [1, 100, 10_000].iter() {
        let xml = active_bookings_xml(*count);
        group.bench_with_input(BenchmarkId::new("all_fields", count), &xml, |b, xml| {
            b.iter(|| all_fields(black_box(xml), INT_FIELD_TAG))
        });
    }

    group.finish();
}

pub fn query_benchmark(c: &mut Criterion) {
    let requirements = NodeRequirements::new(4, 8192, 0.5, 64, 10);
    c.bench_function("book_machine_query_string", |b| {
        b.iter(|| black_box(&requirements).to_params().to_query_string())
    });
}

criterion_group!(benches, response_benchmark, query_benchmark);
criterion_main!(benches);
