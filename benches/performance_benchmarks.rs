use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use intervalrs::aggregator::{finalize, ResultEntry, SessionContext};
use intervalrs::store::blend_metrics;
use intervalrs::{
    apply_targets, Baseline, Block, DayType, IntervalPlanner, MetricsSettings, MetricsUpdate,
    Modality, PaceRange, PerformanceMetrics, ProgramVersion, ScoreUnits, SessionTimer,
    WorkoutDefinition,
};

/// Performance benchmarks for the planning and pacing hot paths
///
/// Workouts are sized by rounds per block so the numbers scale with the
/// interval count a session actually produces.

fn workout(day_type: DayType, rounds: u32) -> WorkoutDefinition {
    let block = Block {
        work_duration: Some(60),
        rest_duration: Some(30),
        rounds: Some(rounds),
        pace_range: Some(PaceRange::new(dec!(0.8), dec!(1.0))),
        ..Default::default()
    };
    (1..=4).fold(WorkoutDefinition::new("bench", 1, day_type), |w, n| {
        w.with_block(n, block.clone())
    })
}

fn baseline() -> Baseline {
    Baseline {
        user_id: "bench".to_string(),
        modality: Modality::from("echo_bike"),
        rate: dec!(40),
        units: ScoreUnits::Cal,
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    }
}

fn metrics(day_type: DayType) -> PerformanceMetrics {
    PerformanceMetrics {
        user_id: "bench".to_string(),
        day_type,
        modality: Modality::from("echo_bike"),
        rolling_avg_ratio: Some(dec!(1.05)),
        learned_max_pace: Some(dec!(48)),
        sample_count: 12,
        updated_at: None,
    }
}

fn bench_planning(c: &mut Criterion) {
    let planner = IntervalPlanner::default();
    let mut group = c.benchmark_group("Interval Planning");

    for day_type in [DayType::Interval, DayType::Infinity, DayType::Towers] {
        for &rounds in &[1, 10, 100] {
            let definition = workout(day_type.clone(), rounds);
            group.throughput(Throughput::Elements(planner.plan(&definition).len() as u64));
            group.bench_with_input(
                BenchmarkId::new(day_type.as_str().to_string(), rounds),
                &definition,
                |b, definition| b.iter(|| planner.plan(black_box(definition))),
            );
        }
    }

    group.finish();
}

fn bench_pacing(c: &mut Criterion) {
    let planner = IntervalPlanner::default();
    let baseline = baseline();
    let mut group = c.benchmark_group("Target Pacing");

    for day_type in [DayType::Interval, DayType::Anaerobic] {
        let metrics = metrics(day_type.clone());
        let intervals = planner.plan(&workout(day_type.clone(), 100));

        group.throughput(Throughput::Elements(intervals.len() as u64));
        group.bench_function(BenchmarkId::new("apply_targets", day_type.as_str()), |b| {
            b.iter_batched(
                || intervals.clone(),
                |mut intervals| {
                    apply_targets(&mut intervals, Some(&baseline), Some(&metrics), &day_type);
                    intervals
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_session_timer(c: &mut Criterion) {
    let planner = IntervalPlanner::default();
    let intervals = planner.plan(&workout(DayType::Interval, 10));
    let modality = Modality::from("echo_bike");
    let baseline = baseline();

    c.bench_function("timer_full_countdown", |b| {
        b.iter_batched(
            || SessionTimer::new(intervals.clone(), DayType::Interval),
            |mut timer| {
                let _ = timer.start(Some(&modality), Some(&baseline));
                while timer.tick().is_some() {}
                timer
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let planner = IntervalPlanner::default();
    let mut intervals = planner.plan(&workout(DayType::Interval, 25));
    apply_targets(&mut intervals, Some(&baseline()), None, &DayType::Interval);
    let entry = ResultEntry::new("3500")
        .with_heart_rate("152", "181")
        .with_perceived_exertion("8");
    let settings = MetricsSettings::default();

    c.bench_function("finalize_session", |b| {
        b.iter(|| {
            let context = SessionContext {
                user_id: "bench".to_string(),
                workout_id: "bench".to_string(),
                program_day: 1,
                program_version: ProgramVersion::FiveDay,
                program_day_number: 1,
                day_type: DayType::Interval,
                modality: Modality::from("echo_bike"),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            };
            finalize(context, black_box(&intervals), &entry)
        })
    });

    let update = MetricsUpdate {
        user_id: "bench".to_string(),
        day_type: DayType::Interval,
        modality: Modality::from("echo_bike"),
        new_ratio: Some(dec!(1.08)),
        new_pace: Some(dec!(41.3)),
        is_max_effort: false,
    };
    c.bench_function("blend_metrics", |b| {
        b.iter(|| {
            blend_metrics(
                Some(metrics(DayType::Interval)),
                black_box(&update),
                &settings,
                Utc::now(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_planning,
    bench_pacing,
    bench_session_timer,
    bench_aggregation
);
criterion_main!(benches);
