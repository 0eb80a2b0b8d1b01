use crate::models::{PricePoint, PriceSeries};
use log::info;
use statrs::statistics::Statistics;

/// Replaces missing closes with the mean of the observed closes.
pub fn fill_missing_with_mean(series: &PriceSeries) -> PriceSeries {
    let observed: Vec<f64> = series.points().iter().filter_map(|p| p.close).collect();
    let missing = series.len() - observed.len();
    if missing == 0 || observed.is_empty() {
        return series.clone();
    }

    let mean = observed.iter().mean();
    info!(
        "Filled {} missing close(s) for {} with mean {:.4}",
        missing,
        series.ticker(),
        mean
    );
    let points = series
        .points()
        .iter()
        .map(|p| PricePoint {
            date: p.date,
            close: Some(p.close.unwrap_or(mean)),
        })
        .collect();
    series.with_points(points)
}

/// Removes observations without a close.
pub fn drop_missing(series: &PriceSeries) -> PriceSeries {
    let points = series
        .points()
        .iter()
        .filter(|p| p.close.is_some())
        .copied()
        .collect();
    series.with_points(points)
}
