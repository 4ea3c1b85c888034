use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ehyd::model::grid::{grid_search, SarimaGrid};
use ehyd::{Network, Sarima, SarimaOrder, Station, StationLocator};

fn seasonal_series(n: usize) -> Vec<f64> {
    let mut state: u64 = 7;
    (0..n)
        .map(|t| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let noise = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
            250.0 + 1.5 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin() + 0.2 * noise
        })
        .collect()
}

fn bench_sarima(c: &mut Criterion) {
    let y = seasonal_series(240);
    let order = SarimaOrder::seasonal(1, 0, 1, 0, 1, 1, 12);
    c.bench_function("sarima_fit", |b| {
        b.iter(|| Sarima::fit(black_box(order), black_box(&y), &[]))
    });

    let grid = SarimaGrid {
        p: vec![0, 1],
        d: vec![0, 1],
        q: vec![0, 1],
        seasonal_p: vec![0],
        seasonal_d: vec![1],
        seasonal_q: vec![0],
        period: 12,
    };
    c.bench_function("grid_search_8", |b| {
        b.iter(|| grid_search(black_box(&y), &[], black_box(&grid)))
    });
}

fn bench_nearest(c: &mut Criterion) {
    let stations: Vec<Station> = (0..2000u32)
        .map(|i| {
            let x = (i % 50) as f64 * 1000.0 + (i as f64 * 0.37).sin() * 300.0;
            let y = (i / 50) as f64 * 1000.0 + (i as f64 * 0.11).cos() * 300.0;
            Station::new(100_000 + i, Network::Precipitation, x, y)
        })
        .collect();
    let locator = StationLocator::new(stations);
    c.bench_function("nearest_3", |b| {
        b.iter(|| locator.nearest(black_box(24_500.0), black_box(19_750.0), 3))
    });
}

criterion_group!(benches, bench_sarima, bench_nearest);
criterion_main!(benches);
