pub mod decompose;
pub mod optimize;
pub mod returns;
pub mod rolling;

use crate::config::DataSettings;
use crate::data_loader::{load_asset_data, ticker_path};
use crate::models::PriceSeries;
use crate::preprocess::{drop_missing, fill_missing_with_mean};
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// How missing closing prices are treated before analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MissingValuePolicy {
    /// Leave gaps; affected returns drop out of the aligned table.
    #[default]
    Keep,
    /// Replace gaps with the mean observed close.
    FillMean,
    /// Remove observations without a close.
    Drop,
}

impl MissingValuePolicy {
    pub fn apply(self, series: PriceSeries) -> PriceSeries {
        match self {
            MissingValuePolicy::Keep => series,
            MissingValuePolicy::FillMean => fill_missing_with_mean(&series),
            MissingValuePolicy::Drop => drop_missing(&series),
        }
    }

    fn label(self) -> &'static str {
        match self {
            MissingValuePolicy::Keep => "keep",
            MissingValuePolicy::FillMean => "fill-mean",
            MissingValuePolicy::Drop => "drop",
        }
    }
}

pub(crate) fn load_series(
    tickers: &[String],
    data: &DataSettings,
    missing: MissingValuePolicy,
) -> Result<Vec<PriceSeries>> {
    info!(
        "Loading {} from {} (price column '{}', missing values: {})",
        tickers.join(", "),
        data.data_dir.display(),
        data.price_column,
        missing.label()
    );
    let series = load_asset_data(tickers, &data.data_dir, &data.price_column)
        .context("Failed to load price data")?;
    Ok(series.into_iter().map(|s| missing.apply(s)).collect())
}

pub(crate) fn load_single_series(
    ticker: &str,
    data: &DataSettings,
    missing: MissingValuePolicy,
) -> Result<PriceSeries> {
    let mut series = load_series(&[ticker.to_string()], data, missing)?;
    series.pop().with_context(|| {
        format!(
            "No price series loaded from {}",
            ticker_path(&data.data_dir, ticker).display()
        )
    })
}

/// Opens `path` for writing, or stdout when no path is given.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
