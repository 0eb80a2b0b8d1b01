use super::{load_series, open_output, MissingValuePolicy};
use crate::config::DataSettings;
use crate::report::render_asset_summary;
use crate::returns::{annualized_summary, compute_returns};
use anyhow::Result;
use log::info;
use std::io::Write;

/// Prints annualized return and volatility for each ticker over the dates all
/// tickers share.
pub fn run(tickers: &[String], data: &DataSettings, missing: MissingValuePolicy) -> Result<()> {
    let series = load_series(tickers, data, missing)?;
    let table = compute_returns(&series)?;
    info!("Summarizing {} aligned daily returns", table.len());

    let mut out = open_output(None)?;
    write!(out, "{}", render_asset_summary(&annualized_summary(&table)))?;
    out.flush()?;
    Ok(())
}
