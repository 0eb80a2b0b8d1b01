use crate::decomposition::Decomposition;
use crate::error::Result;
use crate::models::{OptimizationResult, PortfolioCandidate};
use crate::returns::AssetSummary;
use crate::rolling::RollingPoint;
use std::fmt::Write as _;
use std::io::Write;

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Human-readable optimization summary: one weight line per ticker followed by
/// expected return, volatility and Sharpe ratio.
pub fn render_optimization_report(result: &OptimizationResult) -> String {
    let mut out = String::from("Optimal Weights:\n");
    for (ticker, weight) in result.tickers.iter().zip(&result.weights) {
        let _ = writeln!(out, "{}: {}", ticker, percent(*weight));
    }
    let _ = writeln!(
        out,
        "Expected Annual Return: {}",
        percent(result.expected_return)
    );
    let _ = writeln!(out, "Volatility: {}", percent(result.volatility));
    let _ = writeln!(out, "Sharpe Ratio: {:.2}", result.sharpe_ratio);
    out
}

pub fn render_asset_summary(summaries: &[AssetSummary]) -> String {
    let mut out = String::new();
    for summary in summaries {
        let _ = writeln!(
            out,
            "{}: annual return {}, annual volatility {} ({} observations)",
            summary.ticker,
            percent(summary.annualized_return),
            percent(summary.annualized_volatility),
            summary.observations
        );
    }
    out
}

pub fn write_result_json<W: Write>(writer: W, result: &OptimizationResult) -> Result<()> {
    serde_json::to_writer_pretty(writer, result)?;
    Ok(())
}

/// Writes every sampled candidate as `return,volatility,sharpe,<ticker weights...>`.
pub fn write_candidates_csv<W: Write>(
    writer: W,
    tickers: &[String],
    candidates: &[PortfolioCandidate],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![
        "return".to_string(),
        "volatility".to_string(),
        "sharpe".to_string(),
    ];
    header.extend(tickers.iter().cloned());
    csv_writer.write_record(&header)?;

    for candidate in candidates {
        let mut record = vec![
            candidate.expected_return.to_string(),
            candidate.volatility.to_string(),
            candidate.sharpe_ratio.to_string(),
        ];
        record.extend(candidate.weights.iter().map(|w| w.to_string()));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_rolling_csv<W: Write>(writer: W, points: &[RollingPoint]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "close", "rolling_mean", "rolling_std"])?;
    for point in points {
        csv_writer.write_record([
            point.date.to_string(),
            point.close.to_string(),
            optional_cell(point.mean),
            optional_cell(point.std_dev),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_decomposition_csv<W: Write>(writer: W, decomposition: &Decomposition) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "observed", "trend", "seasonal", "residual"])?;
    for idx in 0..decomposition.observed.len() {
        csv_writer.write_record([
            decomposition.dates[idx].to_string(),
            decomposition.observed[idx].to_string(),
            optional_cell(decomposition.trend[idx]),
            decomposition.seasonal[idx].to_string(),
            optional_cell(decomposition.residual[idx]),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
