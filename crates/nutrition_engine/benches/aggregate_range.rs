use chrono::{Days, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use nutrition_engine::{DailyNutritionSummary, FnDayFetcher, NutritionError, RangeAggregator};
use std::hint::black_box;
use tokio::runtime::Builder;

fn summary(log_date: NaiveDate, i: u64) -> DailyNutritionSummary {
    DailyNutritionSummary {
        log_date,
        matched_demographic_group: "Adults".into(),
        total_calories_goal: 2000.0,
        total_calories_consumed: 1400.0 + (i % 9) as f64 * 100.0,
        total_protein_goal: 56.0,
        total_protein_consumed: 40.0 + (i % 5) as f64,
        total_fat_goal: 70.0,
        total_fat_consumed: 65.5,
        total_carbs_goal: 275.0,
        total_carbs_consumed: 240.25,
        detailed_analysis: vec![],
    }
}

fn bench_aggregate_range(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let year: Vec<DailyNutritionSummary> = (0..366u64)
        .map(|i| summary(start + Days::new(i), i))
        .collect();
    let aggregator = RangeAggregator::default();

    c.bench_function("summarize_leap_year", |b| {
        b.iter(|| aggregator.summarize(black_box(&year)))
    });

    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let end = start + Days::new(365);
    let fetcher = FnDayFetcher(move |date: NaiveDate| async move {
        // every third day missing
        let i = (date - start).num_days() as u64;
        if i % 3 == 0 {
            Err(NutritionError::NotFound(date.to_string()))
        } else {
            Ok(summary(date, i))
        }
    });
    c.bench_function("aggregate_leap_year_fan_out", |b| {
        b.to_async(&rt)
            .iter(|| async { aggregator.aggregate(start, end, &fetcher).await })
    });
}

criterion_group!(benches, bench_aggregate_range);
criterion_main!(benches);
