use std::hint::black_box;

use chat_export_viewer::filters::{MessageWindow, apply_filters, parse_filter};
use chat_export_viewer::models::Message;
use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// Generate synthetic messages, one per minute from March 2024
fn generate_messages(num_messages: usize) -> Vec<Message> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    (0..num_messages)
        .map(|i| Message {
            index: i + 1,
            timestamp: start + Duration::minutes(i as i64),
            sender: if i % 50 == 0 { None } else { Some(format!("Person {}", i % 5)) },
            body: format!("Test message {}", i),
            attachment: match i % 6 {
                0 => Some(format!("IMG-{i}.jpg")),
                3 => Some(format!("doc-{i}.pdf")),
                _ => None,
            },
        })
        .collect()
}

fn bench_filter_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_application");

    // Sender filter (case-insensitive substring)
    for size in [1_000, 10_000, 50_000].iter() {
        let messages = generate_messages(*size);
        let filter_expr = parse_filter("from:person").unwrap();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("from_filter", size), size, |b, _| {
            b.iter(|| apply_filters(black_box(messages.clone()), black_box(&filter_expr)).unwrap());
        });
    }

    // Media filter (MIME lookup per attachment)
    for size in [1_000, 10_000, 50_000].iter() {
        let messages = generate_messages(*size);
        let filter_expr = parse_filter("has:media").unwrap();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("media_filter", size), size, |b, _| {
            b.iter(|| apply_filters(black_box(messages.clone()), black_box(&filter_expr)).unwrap());
        });
    }

    // Complex filter (sender AND date range)
    for size in [1_000, 10_000, 50_000].iter() {
        let messages = generate_messages(*size);
        let filter_expr = parse_filter("from:\"person 1\" since:2024-03-02 until:2024-03-20").unwrap();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("complex_filter", size), size, |b, _| {
            b.iter(|| apply_filters(black_box(messages.clone()), black_box(&filter_expr)).unwrap());
        });
    }

    // Date window over the whole list
    for size in [1_000, 10_000, 50_000].iter() {
        let messages = generate_messages(*size);
        let window = MessageWindow::by_date(NaiveDate::from_ymd_opt(2024, 3, 2), NaiveDate::from_ymd_opt(2024, 3, 9));

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("date_window", size), size, |b, _| {
            b.iter(|| window.apply(black_box(&messages)).len());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter_application);
criterion_main!(benches);
