use crate::error::{PortfolioError, Result};
use crate::models::PriceSeries;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub period: usize,
    pub dates: Vec<NaiveDate>,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

/// Additive decomposition `observed = trend + seasonal + residual`. The trend is
/// a centered moving average over one period; for even periods the window spans
/// `period + 1` observations with half weight on both ends, so the trend is
/// undefined for the first and last `period / 2` points.
pub fn seasonal_decompose(series: &PriceSeries, period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(PortfolioError::invalid_input(format!(
            "period must be at least 2 (got {})",
            period
        )));
    }
    let observed = series.complete_closes().ok_or_else(|| {
        PortfolioError::invalid_input(format!(
            "{} contains missing values; handle them before decomposition",
            series.ticker()
        ))
    })?;
    if observed.len() < 2 * period {
        return Err(PortfolioError::invalid_input(format!(
            "{} has {} observations; at least {} are needed for period {}",
            series.ticker(),
            observed.len(),
            2 * period,
            period
        )));
    }

    let trend = centered_moving_average(&observed, period);
    let detrended: Vec<Option<f64>> = observed
        .iter()
        .zip(&trend)
        .map(|(x, t)| t.map(|t| x - t))
        .collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let values: Vec<f64> = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .filter_map(|v| *v)
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        })
        .collect();
    let overall = phase_means.iter().sum::<f64>() / period as f64;
    for mean in &mut phase_means {
        *mean -= overall;
    }

    let seasonal: Vec<f64> = (0..observed.len())
        .map(|idx| phase_means[idx % period])
        .collect();
    let residual = detrended
        .iter()
        .zip(&seasonal)
        .map(|(d, s)| d.map(|d| d - s))
        .collect();

    info!(
        "Decomposed {} observations of {} with period {}",
        observed.len(),
        series.ticker(),
        period
    );
    Ok(Decomposition {
        period,
        dates: series.dates(),
        observed,
        trend,
        seasonal,
        residual,
    })
}

fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] /= 2.0;
        w[period] /= 2.0;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..values.len())
        .map(|idx| {
            if idx < half || idx + half >= values.len() {
                return None;
            }
            let start = idx - half;
            Some(
                weights
                    .iter()
                    .zip(&values[start..start + weights.len()])
                    .map(|(w, v)| w * v)
                    .sum::<f64>(),
            )
        })
        .collect()
}
