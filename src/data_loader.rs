use crate::error::{PortfolioError, Result};
use crate::models::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_PRICE_COLUMN: &str = "Close";
pub const DATE_COLUMN: &str = "Date";

pub fn ticker_path(data_dir: &Path, ticker: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", ticker))
}

/// Loads one CSV file per ticker, in the given order.
pub fn load_asset_data<S: AsRef<str>>(
    tickers: &[S],
    data_dir: &Path,
    price_column: &str,
) -> Result<Vec<PriceSeries>> {
    let mut series = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let ticker = ticker.as_ref();
        let path = ticker_path(data_dir, ticker);
        if !path.exists() {
            return Err(PortfolioError::FileNotFound {
                ticker: ticker.to_string(),
                path,
            });
        }
        series.push(load_price_series(&path, ticker, price_column)?);
    }
    Ok(series)
}

/// Reads a `Date` column and the configured price column. Rows whose date does
/// not parse are skipped, which tolerates the secondary header rows some market
/// data downloads emit. Prices that do not parse are kept as missing.
pub fn load_price_series(path: &Path, ticker: &str, price_column: &str) -> Result<PriceSeries> {
    let file = File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => PortfolioError::FileNotFound {
            ticker: ticker.to_string(),
            path: path.to_path_buf(),
        },
        _ => PortfolioError::Io(err),
    })?;

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN).ok_or_else(|| {
        PortfolioError::InvalidData(format!(
            "{} has no '{}' column",
            path.display(),
            DATE_COLUMN
        ))
    })?;
    let price_idx = column_index(&headers, price_column).ok_or_else(|| {
        PortfolioError::InvalidData(format!(
            "{} has no '{}' column",
            path.display(),
            price_column
        ))
    })?;

    let mut points = Vec::new();
    let mut skipped_rows = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(date) = record.get(date_idx).and_then(parse_trading_date) else {
            skipped_rows += 1;
            continue;
        };
        let close = record.get(price_idx).and_then(parse_price);
        points.push(PricePoint { date, close });
    }

    if skipped_rows > 0 {
        debug!(
            "Skipped {} row(s) without a parseable date in {}",
            skipped_rows,
            path.display()
        );
    }

    points.sort_by_key(|p| p.date);
    let series = PriceSeries::new(ticker, points)?;
    let missing = series.missing_count();
    if missing > 0 {
        warn!(
            "{} has {} observation(s) with a missing '{}' value",
            ticker, missing, price_column
        );
    }
    info!(
        "Loaded {} observations for {} from {}",
        series.len(),
        ticker,
        path.display()
    );
    Ok(series)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_trading_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10)?;
    let rest = &trimmed[10..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
