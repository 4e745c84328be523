use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use session_engine::{enumerate_starts, AvailabilityWindow, BusyBlock, SlotRequest};

fn busy_day() -> (Vec<AvailabilityWindow>, Vec<BusyBlock>) {
    let day = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
    let windows = (0..6)
        .map(|i| {
            let start = day + Duration::hours(6 + 3 * i);
            AvailabilityWindow::new(start, start + Duration::minutes(150)).unwrap()
        })
        .collect();
    let busy = (0..40)
        .map(|i| {
            let start = day + Duration::minutes(360 + 25 * i);
            BusyBlock::new(start, start + Duration::minutes(10)).unwrap()
        })
        .collect();
    (windows, busy)
}

fn bench_enumerate(c: &mut Criterion) {
    let (windows, busy) = busy_day();
    let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

    c.bench_function("enumerate_starts/60min_5min_step", |b| {
        let request = SlotRequest::new(date, 60).with_granularity(5);
        b.iter(|| enumerate_starts(black_box(&request), &windows, &busy).count())
    });

    c.bench_function("enumerate_starts/30min_15min_step", |b| {
        let request = SlotRequest::new(date, 30);
        b.iter(|| enumerate_starts(black_box(&request), &windows, &busy).count())
    });
}

criterion_group!(benches, bench_enumerate);
criterion_main!(benches);
