use crate::error::{PortfolioError, Result};
use crate::models::PriceSeries;
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use statrs::statistics::Statistics;

pub const DEFAULT_ROLLING_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Trailing-window mean and sample standard deviation of closing prices.
/// Observations without a close are dropped before the windows are formed.
pub fn rolling_statistics(series: &PriceSeries, window: usize) -> Result<Vec<RollingPoint>> {
    if window < 2 {
        return Err(PortfolioError::invalid_input(format!(
            "rolling window must be at least 2 (got {})",
            window
        )));
    }
    let observed: Vec<(NaiveDate, f64)> = series
        .points()
        .iter()
        .filter_map(|p| p.close.map(|close| (p.date, close)))
        .collect();
    let dropped = series.len() - observed.len();
    if dropped > 0 {
        debug!(
            "Dropped {} observations without a close from {}",
            dropped,
            series.ticker()
        );
    }
    let closes: Vec<f64> = observed.iter().map(|(_, close)| *close).collect();

    let points = observed
        .iter()
        .enumerate()
        .map(|(idx, (date, close))| {
            let (mean, std_dev) = if idx + 1 >= window {
                let slice = &closes[idx + 1 - window..=idx];
                (Some(slice.iter().mean()), Some(slice.iter().std_dev()))
            } else {
                (None, None)
            };
            RollingPoint {
                date: *date,
                close: *close,
                mean,
                std_dev,
            }
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        PriceSeries::from_closes(
            "TSLA",
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| (start + chrono::Duration::days(i as i64), *c)),
        )
        .unwrap()
    }

    #[test]
    fn fills_once_window_is_complete() {
        let points = rolling_statistics(&series(&[1.0, 2.0, 3.0, 4.0]), 3).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].mean, None);
        assert_eq!(points[1].std_dev, None);
        assert!((points[2].mean.unwrap() - 2.0).abs() < 1e-12);
        assert!((points[2].std_dev.unwrap() - 1.0).abs() < 1e-12);
        assert!((points[3].mean.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn skips_observations_without_a_close() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points: Vec<PricePoint> = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close: *close,
            })
            .collect();
        let gappy = PriceSeries::new("SPY", points).unwrap();

        let rolled = rolling_statistics(&gappy, 3).unwrap();
        assert_eq!(rolled.len(), 4);
        assert!(rolled
            .iter()
            .all(|p| p.date != start + chrono::Duration::days(2)));
        assert!((rolled[2].mean.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(rolled[2].date, start + chrono::Duration::days(3));
        assert!((rolled[3].mean.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_tiny_windows() {
        assert!(rolling_statistics(&series(&[1.0, 2.0]), 1).is_err());
    }
}
