//! demos/plot_forecast.rs
//!
//! Forecasts one groundwater station from an earlier `ehyd prepare` run. The plot shows
//! the hold-out forecast against the held-out observations, followed by the
//! out-of-sample forecast.
//!
//! To run this demo:
//! cargo run --example plot_forecast --features plotting -- <dataset root> <station id>

use std::error::Error;

use ehyd::{Ehyd, PipelineConfig, StationId};
use plotlars::{Axis, Legend, Line, Plot, Rgb, Text, TimeSeriesPlot};
use polars::prelude::*;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let dataset_root = args.next().unwrap_or_else(|| "data".to_string());
    let station: StationId = args.next().map(|s| s.parse()).transpose()?.unwrap_or(300111);

    let pipeline = Ehyd::new(PipelineConfig::builder().dataset_root(dataset_root).build())?;
    let prepared = pipeline.load_prepared()?;

    println!("Forecasting station {}...", station);
    let run = pipeline
        .forecast()
        .prepared(&prepared)
        .stations(vec![station])
        .call()?;
    let Some(forecast) = run.forecasts.first() else {
        return Err(format!("no forecast for station {}", station).into());
    };
    println!("{}", forecast.summary());

    plot_forecast(&forecast.to_dataframe()?, station);
    println!("Plot shown in browser.");
    Ok(())
}

fn plot_forecast(data: &DataFrame, station: StationId) {
    let title = format!("Groundwater level, station {}", station);
    TimeSeriesPlot::builder()
        .data(data)
        .x("date")
        .y("actual")
        .additional_series(vec!["forecast", "lower", "upper"])
        .size(8)
        .colors(vec![
            Rgb(0, 0, 0),
            Rgb(235, 117, 0),
            Rgb(69, 157, 230),
            Rgb(69, 157, 230),
        ])
        .lines(vec![Line::Solid, Line::Solid, Line::Dot, Line::Dot])
        .plot_title(Text::from(title.as_str()).size(18))
        .legend(&Legend::new().x(0.05).y(0.9))
        .x_title("month")
        .y_title(Text::from("m a.s.l.").color(Rgb(0, 0, 0)))
        .y_axis(&Axis::new().value_color(Rgb(0, 0, 0)).show_grid(false))
        .build()
        .plot();
}
