use crate::error::{PortfolioError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Daily closing prices for one ticker, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let ticker = ticker.into();
        if let Some(window) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(PortfolioError::invalid_input(format!(
                "dates for {} must be strictly increasing ({} follows {})",
                ticker, window[1].date, window[0].date
            )));
        }
        Ok(Self { ticker, points })
    }

    /// Builds a complete series from `(date, close)` pairs.
    pub fn from_closes(
        ticker: impl Into<String>,
        closes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let points = closes
            .into_iter()
            .map(|(date, close)| PricePoint {
                date,
                close: Some(close),
            })
            .collect();
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| p.close.is_none()).count()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Closing prices, or `None` if any observation is missing.
    pub fn complete_closes(&self) -> Option<Vec<f64>> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub(crate) fn with_points(&self, points: Vec<PricePoint>) -> Self {
        Self {
            ticker: self.ticker.clone(),
            points,
        }
    }
}

/// Aligned daily returns for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReturns {
    pub ticker: String,
    pub returns: Vec<f64>,
}

impl AssetReturns {
    pub fn new(ticker: impl Into<String>, returns: Vec<f64>) -> Self {
        Self {
            ticker: ticker.into(),
            returns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCandidate {
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    #[serde(
        serialize_with = "serialize_sharpe_ratio",
        deserialize_with = "deserialize_sharpe_ratio"
    )]
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub tickers: Vec<String>,
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    #[serde(
        serialize_with = "serialize_sharpe_ratio",
        deserialize_with = "deserialize_sharpe_ratio"
    )]
    pub sharpe_ratio: f64,
    pub risk_free_rate: f64,
    pub samples_evaluated: usize,
}

impl OptimizationResult {
    pub(crate) fn from_candidate(
        tickers: Vec<String>,
        candidate: PortfolioCandidate,
        risk_free_rate: f64,
        samples_evaluated: usize,
    ) -> Self {
        Self {
            tickers,
            weights: candidate.weights,
            expected_return: candidate.expected_return,
            volatility: candidate.volatility,
            sharpe_ratio: candidate.sharpe_ratio,
            risk_free_rate,
            samples_evaluated,
        }
    }

    pub fn weight_for(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .and_then(|idx| self.weights.get(idx).copied())
    }
}

const NEG_INFINITY_LABEL: &str = "-inf";
const POS_INFINITY_LABEL: &str = "inf";
const NAN_LABEL: &str = "NaN";

/// JSON has no infinities, so non-finite Sharpe ratios are written as labels.
fn serialize_sharpe_ratio<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str(NAN_LABEL)
    } else if value.is_sign_negative() {
        serializer.serialize_str(NEG_INFINITY_LABEL)
    } else {
        serializer.serialize_str(POS_INFINITY_LABEL)
    }
}

fn deserialize_sharpe_ratio<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid sharpe ratio {}", number))),
        Value::String(label) => match label.as_str() {
            NEG_INFINITY_LABEL => Ok(f64::NEG_INFINITY),
            POS_INFINITY_LABEL => Ok(f64::INFINITY),
            NAN_LABEL => Ok(f64::NAN),
            other => Err(serde::de::Error::custom(format!(
                "invalid sharpe ratio '{}'",
                other
            ))),
        },
        other => Err(serde::de::Error::custom(format!(
            "invalid sharpe ratio {}",
            other
        ))),
    }
}
