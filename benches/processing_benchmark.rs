use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use isd_weather_stats::analyzers::{
    correlation, AnomalyMode, MomentAccumulator, MonthlyAnomalyDetector, StddevKind,
    YearCorrelationAggregator,
};
use isd_weather_stats::models::DatedObservation;
use isd_weather_stats::processors::{StreamMapper, StreamReducer};
use isd_weather_stats::readers::RecordFilter;
use std::io::Cursor;

fn isd_line(date: NaiveDate, temperature: i32, humidity: i32) -> String {
    let mut line = format!(
        "007103777099999{}12004+51317-005300FM-12+0074",
        date.format("%Y%m%d")
    );
    while line.len() < 87 {
        line.push('9');
    }
    line.push_str(&format!("{:+05}1{:+05}1102001ADDGF108991", temperature, humidity));
    line
}

// Synthetic ISD file: one record per day, every 17th with a missing reading
fn create_isd_lines(days: usize) -> Vec<String> {
    let base = NaiveDate::from_ymd_opt(1928, 1, 1).unwrap();
    (0..days)
        .map(|day| {
            let date = base + Duration::days(day as i64);
            let temperature = ((day * 37) % 400) as i32 - 150;
            let humidity = if day % 17 == 0 {
                9999
            } else {
                ((day * 53) % 300) as i32 - 200
            };
            isd_line(date, temperature, humidity)
        })
        .collect()
}

fn create_observations(days: usize) -> Vec<DatedObservation> {
    let base = NaiveDate::from_ymd_opt(1928, 1, 1).unwrap();
    (0..days)
        .map(|day| DatedObservation {
            date: base + Duration::days(day as i64),
            latitude: 51317,
            longitude: -5300,
            altitude: 74,
            temperature: ((day * 37) % 400) as i32 - 150,
            humidity: ((day * 53) % 300) as i32 - 200,
        })
        .collect()
}

fn benchmark_record_filter(c: &mut Criterion) {
    let lines = create_isd_lines(10_000);
    let filter = RecordFilter::new();

    c.bench_function("record_filter_10k_lines", |b| {
        b.iter(|| {
            lines
                .iter()
                .filter_map(|line| filter.filter_line(black_box(line.as_bytes())).ok())
                .count()
        })
    });
}

fn benchmark_streaming_pipeline(c: &mut Criterion) {
    let input = create_isd_lines(10_000).join("\n");
    let mapper = StreamMapper::new();
    let reducer = StreamReducer::new();

    let mut mapped = Vec::new();
    mapper.run(Cursor::new(input.as_bytes()), &mut mapped).unwrap();

    c.bench_function("stream_mapper_10k_lines", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(mapped.len());
            mapper.run(Cursor::new(black_box(input.as_bytes())), &mut out).unwrap();
            out
        })
    });

    c.bench_function("stream_reducer_10k_tuples", |b| {
        b.iter(|| reducer.reduce(Cursor::new(black_box(&mapped[..]))).unwrap())
    });
}

fn benchmark_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation");

    for size in [1_000, 10_000, 100_000] {
        let xs: Vec<f64> = (0..size).map(|i| ((i * 37) % 400) as f64).collect();
        let ys: Vec<f64> = (0..size).map(|i| ((i * 53) % 300) as f64).collect();

        group.bench_with_input(BenchmarkId::new("pearson", size), &size, |b, _| {
            b.iter(|| correlation(black_box(&xs), black_box(&ys)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("moments", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = MomentAccumulator::default();
                acc.extend(xs.iter().map(|&x| x as i32));
                acc.stddev(StddevKind::Population)
            })
        });
    }

    group.finish();

    let observations = create_observations(36_500);
    c.bench_function("year_aggregator_100_years", |b| {
        b.iter(|| {
            let aggregator: YearCorrelationAggregator = observations
                .iter()
                .map(|obs| obs.to_cleaned())
                .collect();
            aggregator.finish().unwrap()
        })
    });
}

fn benchmark_monthly_anomalies(c: &mut Criterion) {
    let mut group = c.benchmark_group("monthly_anomalies");

    for years in [10, 100] {
        let observations = create_observations(years * 365);
        let detector = MonthlyAnomalyDetector::new(AnomalyMode::Corrected);

        group.bench_with_input(BenchmarkId::new("detect", years), &years, |b, _| {
            b.iter(|| detector.detect(black_box(&observations)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_record_filter,
    benchmark_streaming_pipeline,
    benchmark_statistics,
    benchmark_monthly_anomalies
);
criterion_main!(benches);
