use super::{load_single_series, open_output, MissingValuePolicy};
use crate::config::DataSettings;
use crate::report::write_rolling_csv;
use crate::rolling::rolling_statistics;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(
    ticker: &str,
    window: usize,
    data: &DataSettings,
    missing: MissingValuePolicy,
    output: Option<&Path>,
) -> Result<()> {
    let series = load_single_series(ticker, data, missing)?;
    let points = rolling_statistics(&series, window)?;
    info!(
        "Computed {}-observation rolling statistics for {} ({} rows)",
        window,
        ticker,
        points.len()
    );
    write_rolling_csv(open_output(output)?, &points)?;
    Ok(())
}
