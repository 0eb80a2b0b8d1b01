use crate::data_loader::DEFAULT_PRICE_COLUMN;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_NUM_PORTFOLIOS: usize = 5000;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_DATA_DIR: &str = "../data/raw";
pub const DEFAULT_TICKERS: [&str; 3] = ["TSLA", "BND", "SPY"];

/// Settings for a single optimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub num_portfolios: usize,
    pub risk_free_rate: f64,
    /// Seed for the sampling RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Evaluate sampled candidates on the rayon pool.
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            num_portfolios: DEFAULT_NUM_PORTFOLIOS,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            seed: None,
            parallel: false,
            show_progress: false,
        }
    }
}

impl OptimizerConfig {
    /// Reads `NUM_PORTFOLIOS`, `RISK_FREE_RATE`, `RANDOM_SEED` and
    /// `PARALLEL_SAMPLING`; absent keys keep their defaults.
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let num_portfolios =
            optional_setting_usize(settings, "NUM_PORTFOLIOS", 1)?.unwrap_or(defaults.num_portfolios);
        let risk_free_rate = optional_setting_f64(settings, "RISK_FREE_RATE")?
            .unwrap_or(defaults.risk_free_rate);
        let seed = optional_setting_u64(settings, "RANDOM_SEED")?;
        let parallel =
            optional_setting_bool(settings, "PARALLEL_SAMPLING")?.unwrap_or(defaults.parallel);

        Ok(Self {
            num_portfolios,
            risk_free_rate,
            seed,
            parallel,
            show_progress: defaults.show_progress,
        })
    }
}

/// Where price tables are read from.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub data_dir: PathBuf,
    pub price_column: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
        }
    }
}

impl DataSettings {
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: optional_setting(settings, "DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            price_column: optional_setting(settings, "PRICE_COLUMN")
                .map(str::to_string)
                .unwrap_or(defaults.price_column),
        }
    }
}

/// Snapshot of the process environment as a settings map.
pub fn settings_from_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Splits a comma or whitespace separated ticker list. Case is preserved because
/// tickers name `{ticker}.csv` files.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn optional_setting_f64(settings: &HashMap<String, String>, key: &str) -> Result<Option<f64>> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(None);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("Setting {} must be a number (value: {})", key, raw))?;
    if !value.is_finite() {
        return Err(anyhow!("Setting {} must be finite (value: {})", key, raw));
    }
    Ok(Some(value))
}

fn optional_setting_usize(
    settings: &HashMap<String, String>,
    key: &str,
    min: usize,
) -> Result<Option<usize>> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(None);
    };
    let value = raw
        .parse::<usize>()
        .map_err(|_| anyhow!("Setting {} must be a non-negative integer (value: {})", key, raw))?;
    if value < min {
        return Err(anyhow!(
            "Setting {} must be >= {} (value: {})",
            key,
            min,
            raw
        ));
    }
    Ok(Some(value))
}

fn optional_setting_u64(settings: &HashMap<String, String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| anyhow!("Setting {} must be a non-negative integer (value: {})", key, raw))
}

fn optional_setting_bool(settings: &HashMap<String, String>, key: &str) -> Result<Option<bool>> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(anyhow!("Setting {} must be a boolean (value: {})", key, raw)),
    }
}
