use super::{load_single_series, open_output, MissingValuePolicy};
use crate::config::DataSettings;
use crate::decomposition::seasonal_decompose;
use crate::report::write_decomposition_csv;
use anyhow::Result;
use std::path::Path;

pub fn run(
    ticker: &str,
    period: usize,
    data: &DataSettings,
    missing: MissingValuePolicy,
    output: Option<&Path>,
) -> Result<()> {
    let series = load_single_series(ticker, data, missing)?;
    let decomposition = seasonal_decompose(&series, period)?;
    write_decomposition_csv(open_output(output)?, &decomposition)?;
    Ok(())
}
