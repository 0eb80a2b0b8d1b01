use crate::error::{PortfolioError, Result};
use crate::models::{AssetReturns, PriceSeries, TRADING_DAYS_PER_YEAR};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

/// Day-over-day fractional change, keyed by the later date.
///
/// A return is missing when either close is missing or the earlier close is zero.
pub fn daily_returns(series: &PriceSeries) -> Vec<(NaiveDate, Option<f64>)> {
    series
        .points()
        .windows(2)
        .map(|window| {
            let change = match (window[0].close, window[1].close) {
                (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
                _ => None,
            };
            (window[1].date, change.filter(|value| value.is_finite()))
        })
        .collect()
}

/// Returns of several assets aligned on the dates every asset has a return for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnsTable {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetReturns>,
}

/// Inner-joins per-asset daily returns by date, dropping rows with any missing value.
pub fn compute_returns(series: &[PriceSeries]) -> Result<ReturnsTable> {
    if series.is_empty() {
        return Err(PortfolioError::invalid_input(
            "at least one price series is required",
        ));
    }

    let per_asset: Vec<HashMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| {
            daily_returns(s)
                .into_iter()
                .filter_map(|(date, value)| value.map(|v| (date, v)))
                .collect()
        })
        .collect();

    let mut date_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for returns in &per_asset {
        for date in returns.keys() {
            *date_counts.entry(*date).or_default() += 1;
        }
    }
    let dates: Vec<NaiveDate> = date_counts
        .into_iter()
        .filter(|(_, count)| *count == series.len())
        .map(|(date, _)| date)
        .collect();

    let assets = series
        .iter()
        .zip(&per_asset)
        .map(|(s, returns)| {
            AssetReturns::new(s.ticker(), dates.iter().map(|d| returns[d]).collect())
        })
        .collect();

    info!(
        "Aligned returns for {} asset(s) over {} shared date(s)",
        series.len(),
        dates.len()
    );
    Ok(ReturnsTable { dates, assets })
}

impl ReturnsTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[AssetReturns] {
        &self.assets
    }

    pub fn tickers(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.ticker.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn mean_returns(&self) -> Vec<f64> {
        mean_returns(&self.assets)
    }

    pub fn covariance_matrix(&self) -> Vec<Vec<f64>> {
        covariance_matrix(&self.assets)
    }
}

/// Daily mean return per asset.
pub fn mean_returns(assets: &[AssetReturns]) -> Vec<f64> {
    assets.iter().map(|a| a.returns.iter().mean()).collect()
}

/// Sample covariance (n - 1 denominator) of daily returns.
pub fn covariance_matrix(assets: &[AssetReturns]) -> Vec<Vec<f64>> {
    let n = assets.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let cov = assets[i].returns.iter().covariance(assets[j].returns.iter());
            matrix[i][j] = cov;
            matrix[j][i] = cov;
        }
    }
    matrix
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub ticker: String,
    pub observations: usize,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
}

/// Annualized mean return and volatility per asset.
pub fn annualized_summary(table: &ReturnsTable) -> Vec<AssetSummary> {
    table
        .assets
        .iter()
        .map(|asset| AssetSummary {
            ticker: asset.ticker.clone(),
            observations: asset.returns.len(),
            annualized_return: asset.returns.iter().mean() * TRADING_DAYS_PER_YEAR,
            annualized_volatility: asset.returns.iter().std_dev() * TRADING_DAYS_PER_YEAR.sqrt(),
        })
        .collect()
}
