use super::{load_series, open_output, MissingValuePolicy};
use crate::config::{DataSettings, OptimizerConfig};
use crate::optimizer::PortfolioOptimizer;
use crate::report::{render_optimization_report, write_candidates_csv, write_result_json};
use crate::returns::compute_returns;
use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::PathBuf;

pub struct OptimizeOptions {
    pub tickers: Vec<String>,
    pub data: DataSettings,
    pub config: OptimizerConfig,
    pub missing: MissingValuePolicy,
    /// Emit the result as JSON instead of the text report.
    pub json: bool,
    /// Destination for every sampled candidate as CSV.
    pub candidates_output: Option<PathBuf>,
}

pub fn run(options: &OptimizeOptions) -> Result<()> {
    info!(
        "Received optimize command for {} ({} samples, risk-free rate {:.4})",
        options.tickers.join(", "),
        options.config.num_portfolios,
        options.config.risk_free_rate
    );
    let series = load_series(&options.tickers, &options.data, options.missing)?;
    let table = compute_returns(&series)?;
    if let (Some(first), Some(last)) = (table.dates().first(), table.dates().last()) {
        info!(
            "Using {} aligned daily returns from {} to {}",
            table.len(),
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }

    let optimizer = PortfolioOptimizer::new(options.config.clone());
    let run = optimizer
        .run(table.assets())
        .context("Portfolio optimization failed")?;

    if let Some(path) = &options.candidates_output {
        let writer = open_output(Some(path))?;
        write_candidates_csv(writer, &run.result.tickers, &run.candidates)?;
        info!(
            "Wrote {} sampled portfolios to {}",
            run.candidates.len(),
            path.display()
        );
    }

    let mut out = open_output(None)?;
    if options.json {
        write_result_json(&mut out, &run.result)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render_optimization_report(&run.result))?;
    }
    out.flush()?;
    Ok(())
}
