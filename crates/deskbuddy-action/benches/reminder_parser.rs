//! Benchmarks for the free-text reminder parser.
//!
//! The parser runs on the control loop for every committed reminder, so a
//! single parse should stay well under a millisecond.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deskbuddy_action::reminder::parse;

const SAMPLES: [&str; 8] = [
    "team meeting on thursday aug 18 at 2 pm",
    "call mom today at 3:30 pm",
    "remind me to pay rent 21/11",
    "reminder: dentist on the 3rd of november at 9:15",
    "set a reminder to water the plants tomorrow",
    "tax filing april 15th, 2027 at 5pm",
    "next friday standup",
    "buy oat milk",
];

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 17)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn bench_parse(c: &mut Criterion) {
    let now = now();
    // Compile the lazily built regexes outside the measurement.
    let _ = parse(SAMPLES[0], now);

    let mut group = c.benchmark_group("reminder_parser");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("single", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let parsed = parse(black_box(SAMPLES[idx % SAMPLES.len()]), now);
            idx += 1;
            parsed
        });
    });

    group.bench_function("batch_of_samples", |b| {
        b.iter(|| {
            SAMPLES
                .iter()
                .map(|text| parse(black_box(text), now))
                .collect::<Vec<_>>()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
