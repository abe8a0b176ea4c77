//! Benchmarks for submission-harvest
//!
//! Run with: cargo bench

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use submission_harvest::types::{RawEntry, SubmissionRecord};

fn sample_record() -> SubmissionRecord {
    SubmissionRecord {
        id: "8xwlg".into(),
        author: "someone".into(),
        title: "A very old painting".into(),
        score: 51234,
        upvote_ratio: 0.93,
        created: NaiveDate::from_ymd_opt(2018, 7, 11).unwrap(),
        subreddit: "Art".into(),
    }
}

fn benchmark_queue_operations(c: &mut Criterion) {
    use submission_harvest::pipeline::SubmissionQueue;

    c.bench_function("queue_push_drain_1000", |b| {
        let record = sample_record();

        b.iter(|| {
            let queue = SubmissionQueue::new();
            let sender = queue.sender();
            for _ in 0..1000 {
                let _ = sender.push(record.clone());
            }
            drop(sender);
            black_box(queue.into_drain().count());
        })
    });
}

fn benchmark_filter(c: &mut Criterion) {
    use submission_harvest::filter;

    let record = sample_record();
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    c.bench_function("filter_evaluate", |b| {
        b.iter(|| {
            black_box(filter::evaluate(
                black_box(&record),
                black_box("https://i.redd.it/abcdef.jpg"),
                today,
            ));
        })
    });
}

fn benchmark_record_conversion(c: &mut Criterion) {
    c.bench_function("record_from_raw", |b| {
        let raw = RawEntry {
            id: "8xwlg".into(),
            author: None,
            title: "A very old painting".into(),
            score: 51234,
            upvote_ratio: 0.93,
            created_utc: 1_531_300_000,
            url: "https://i.redd.it/abcdef.jpg".into(),
        };

        b.iter(|| black_box(SubmissionRecord::from_raw_in(&raw, "Art", &chrono::Utc)))
    });
}

criterion_group!(
    benches,
    benchmark_queue_operations,
    benchmark_filter,
    benchmark_record_conversion
);
criterion_main!(benches);
