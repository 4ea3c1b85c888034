use chrono::{Datelike, NaiveDate};
use ehyd::model::grid::SarimaGrid;
use ehyd::{Calendar, Ehyd, EhydError, Month, Network, PipelineConfig};
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const TARGETS: [(u32, f64, f64); 4] = [
    (300001, 0.0, 0.0),
    (300002, 10_000.0, 0.0),
    (300003, 0.0, 10_000.0),
    (300004, 10_000.0, 10_000.0),
];
const RAIN: [(u32, f64, f64); 3] = [
    (100001, 1_000.0, 1_000.0),
    (100002, 9_000.0, 1_000.0),
    (100003, 5_000.0, 9_000.0),
];

fn write_latin1(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
    fs::write(path, bytes).unwrap();
}

fn decimal(v: f64) -> String {
    format!("{:.3}", v).replace('.', ",")
}

fn station_list(stations: &[(u32, f64, f64)]) -> String {
    let mut text = String::from("dbmsnr;hzbnr01;x;y\n");
    for (i, (id, x, y)) in stations.iter().enumerate() {
        text.push_str(&format!("{};{};{};{}\n", i, id, decimal(*x), decimal(*y)));
    }
    text
}

fn season(month: u32) -> f64 {
    (2.0 * PI * month as f64 / 12.0).sin()
}

/// Ten years (1995..2004) of monthly groundwater levels and daily precipitation.
fn dataset() -> TempDir {
    let root = tempdir().unwrap();
    let gw = root.path().join("Groundwater");
    write_latin1(&gw.join("messstellen_alle.csv"), &station_list(&TARGETS));

    for (n, (id, _, _)) in TARGETS.iter().enumerate() {
        let mut text = format!("Messstelle:;Brunnen {}\nHZB-Nummer:;{}\nWerte:\n", n, id);
        for year in 1995..=2004 {
            for month in 1..=12 {
                let t = (year - 1995) as f64 * 12.0 + month as f64;
                let wobble = ((t * 1.7 + n as f64).sin()) * 0.05;
                let value = if n == 0 && year == 2000 && month == 6 {
                    "Lücke".to_string()
                } else {
                    decimal(240.0 + 5.0 * n as f64 + 0.8 * season(month) + wobble)
                };
                text.push_str(&format!("01.{:02}.{} 00:00:00;{};\n", month, year, value));
            }
        }
        text.push_str("01.01.2005 00:00:00;0,0;\n");
        write_latin1(
            &gw.join("Grundwasserstand-Monatsmittel")
                .join(format!("Grundwasserstand-Monatsmittel-{}.csv", id)),
            &text,
        );
    }
    write_latin1(
        &gw.join("Grundwasserstand-Monatsmittel").join("Grundwasserstand-Monatsmittel-abcdef.csv"),
        "Werte:\n01.01.2000 00:00:00;1,0;\n",
    );

    let rain = root.path().join("Precipitation");
    write_latin1(&rain.join("messstellen_alle.csv"), &station_list(&RAIN));
    for (n, (id, _, _)) in RAIN.iter().enumerate() {
        let mut text = String::from("Werte:\n");
        let mut date = NaiveDate::from_ymd_opt(1995, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
        while date <= end {
            let value = 3.0 + n as f64 + 2.0 * season(date.month()) + (date.day() % 3) as f64 * 0.1;
            text.push_str(&format!("{} 00:00;{};\n", date.format("%d.%m.%Y"), decimal(value)));
            date = date.succ_opt().unwrap();
        }
        write_latin1(
            &rain.join("N-Tagessummen").join(format!("N-Tagessummen-{}.csv", id)),
            &text,
        );
    }
    root
}

fn config(root: &Path, work_dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .dataset_root(root)
        .work_dir(work_dir)
        .calendar(Calendar::new(Month::new(1, 1995), Month::new(12, 2004)))
        .horizon(12)
        .max_features(3)
        .grid(SarimaGrid {
            p: vec![0, 1],
            d: vec![0],
            q: vec![0],
            seasonal_p: vec![0],
            seasonal_d: vec![0],
            seasonal_q: vec![0],
            period: 12,
        })
        .build()
}

#[test]
fn prepare_then_forecast() {
    let root = dataset();
    let work = tempdir().unwrap();
    let pipeline = Ehyd::new(config(root.path(), work.path())).unwrap();

    let prepared = pipeline.prepare().unwrap();
    assert_eq!(prepared.targets(), vec![300001, 300002, 300003, 300004]);
    assert_eq!(
        prepared.neighbours.neighbours(300001, Network::Precipitation),
        &[100001, 100002, 100003]
    );
    assert_eq!(
        prepared.neighbours.neighbours(300002, Network::Precipitation)[0],
        100002
    );
    assert!(prepared.neighbours.neighbours(300001, Network::Snowfall).is_empty());

    let gw = &prepared.stores[&Network::GroundwaterLevel];
    let first = gw.get(300001).unwrap();
    assert_eq!(first.len(), 120);
    assert_eq!(first.nan_count(), 0, "the June 2000 gap is imputed");
    assert_eq!(prepared.stores[&Network::Precipitation].len(), 3);

    assert!(work.path().join("gw_level.bin").is_file());
    assert!(work.path().join("neighbors.bin").is_file());
    let neighbours_csv = fs::read_to_string(work.path().join("neighbors.csv")).unwrap();
    assert!(neighbours_csv.starts_with("hzbnr01,nearest_gw_temp,nearest_rain"));
    assert!(neighbours_csv.contains("100001|100002|100003"));

    let reloaded = pipeline.load_prepared().unwrap();
    assert_eq!(reloaded.neighbours, prepared.neighbours);
    assert_eq!(
        reloaded.stores[&Network::GroundwaterLevel],
        prepared.stores[&Network::GroundwaterLevel]
    );

    let run = pipeline.forecast().prepared(&reloaded).call().unwrap();
    assert!(run.failures.is_empty(), "{:?}", run.failures);
    assert_eq!(run.forecasts.len(), 4);
    assert!(run.selection.selected.len() <= 3);
    assert!(run
        .selection
        .selected
        .iter()
        .all(|name| !name.starts_with("gw_level")));

    for forecast in &run.forecasts {
        assert_eq!(forecast.test_months.first(), Some(&Month::new(1, 2004)));
        assert_eq!(forecast.predicted.horizon(), 12);
        assert!(forecast.smape.is_finite());
        assert!(forecast.smape < 5.0, "{}", forecast.summary());
        assert_eq!(forecast.future_months.first(), Some(&Month::new(1, 2005)));
    }

    assert!(work.path().join("frames").join("300001.parquet").is_file());
    assert!(work.path().join("forecasts").join("300004.csv").is_file());
    let summary = fs::read_to_string(work.path().join("forecasts.csv")).unwrap();
    assert_eq!(summary.lines().count(), 5);
    assert!(!work.path().join("snapshots").exists());
}

#[test]
fn forecast_can_be_limited_to_stations() {
    let root = dataset();
    let work = tempdir().unwrap();
    let pipeline = Ehyd::new(config(root.path(), work.path())).unwrap();
    let prepared = pipeline.prepare().unwrap();

    let run = pipeline
        .forecast()
        .prepared(&prepared)
        .stations(vec![300003])
        .call()
        .unwrap();
    assert_eq!(run.forecasts.len(), 1);
    assert_eq!(run.forecasts[0].station, 300003);
}

#[test]
fn points_file_restricts_targets() {
    let root = dataset();
    let work = tempdir().unwrap();
    let points = root.path().join("gw_test_empty.csv");
    fs::write(&points, "date,300002,300004,999999\n").unwrap();

    let mut config = config(root.path(), work.path());
    config.points_file = Some(points);
    config.write_snapshots = true;
    let pipeline = Ehyd::new(config).unwrap();

    let prepared = pipeline.prepare().unwrap();
    assert_eq!(prepared.targets(), vec![300002, 300004]);
    assert_eq!(prepared.stores[&Network::GroundwaterLevel].len(), 2);

    pipeline.forecast().prepared(&prepared).call().unwrap();
    assert!(work.path().join("snapshots").join("2004-12.parquet").is_file());
}

#[test]
fn forecast_without_prepare_reports_missing_cache() {
    let root = dataset();
    let work = tempdir().unwrap();
    let pipeline = Ehyd::new(config(root.path(), work.path())).unwrap();
    assert!(matches!(
        pipeline.load_prepared(),
        Err(EhydError::Persistence(_))
    ));
}

#[test]
fn diagnostics_report_coverage() {
    let root = dataset();
    let work = tempdir().unwrap();
    let pipeline = Ehyd::new(config(root.path(), work.path())).unwrap();

    let report = pipeline.diagnostics().unwrap();
    let gw = report[&Network::GroundwaterLevel].unwrap();
    assert_eq!(gw.stations, 4);
    assert_eq!(gw.max_months, 120);
    assert_eq!(gw.earliest_start, Month::new(1, 1995));
    assert!(report[&Network::Snowfall].is_none());
}

#[test]
fn missing_groundwater_folder_is_fatal() {
    let root = tempdir().unwrap();
    let work = tempdir().unwrap();
    let pipeline = Ehyd::new(config(root.path(), work.path())).unwrap();
    assert!(matches!(pipeline.prepare(), Err(EhydError::Ingest(_))));
}
