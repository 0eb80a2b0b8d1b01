use crate::config::OptimizerConfig;
use crate::error::{PortfolioError, Result};
use crate::models::{AssetReturns, OptimizationResult, PortfolioCandidate, TRADING_DAYS_PER_YEAR};
use crate::returns::{covariance_matrix, mean_returns};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;

/// Daily mean returns and annualized covariance of the asset set.
#[derive(Debug, Clone)]
pub struct PortfolioStatistics {
    pub mean_returns: Vec<f64>,
    pub annual_covariance: Vec<Vec<f64>>,
}

impl PortfolioStatistics {
    pub fn from_returns(assets: &[AssetReturns]) -> Self {
        let annual_covariance = covariance_matrix(assets)
            .into_iter()
            .map(|row| row.into_iter().map(|c| c * TRADING_DAYS_PER_YEAR).collect())
            .collect();
        Self {
            mean_returns: mean_returns(assets),
            annual_covariance,
        }
    }

    pub fn asset_count(&self) -> usize {
        self.mean_returns.len()
    }

    pub fn expected_return(&self, weights: &[f64]) -> f64 {
        let daily: f64 = self
            .mean_returns
            .iter()
            .zip(weights)
            .map(|(mean, weight)| mean * weight)
            .sum();
        daily * TRADING_DAYS_PER_YEAR
    }

    /// Square root of `wᵗ Σ w`, clamped so rounding never yields a negative variance.
    pub fn volatility(&self, weights: &[f64]) -> f64 {
        let mut variance = 0.0;
        for (i, wi) in weights.iter().enumerate() {
            for (j, wj) in weights.iter().enumerate() {
                variance += wi * self.annual_covariance[i][j] * wj;
            }
        }
        variance.max(0.0).sqrt()
    }
}

/// `(return - risk_free_rate) / volatility`, or negative infinity when undefined.
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility == 0.0 {
        return f64::NEG_INFINITY;
    }
    let ratio = (expected_return - risk_free_rate) / volatility;
    if ratio.is_finite() {
        ratio
    } else {
        f64::NEG_INFINITY
    }
}

/// Uniform `[0, 1)` draws normalized to sum to one. All-zero draws are redrawn.
pub fn random_weights<R: Rng>(rng: &mut R, asset_count: usize) -> Vec<f64> {
    loop {
        let draws: Vec<f64> = (0..asset_count).map(|_| rng.gen::<f64>()).collect();
        let total: f64 = draws.iter().sum();
        if total > 0.0 {
            return draws.into_iter().map(|w| w / total).collect();
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationRun {
    pub result: OptimizationResult,
    pub candidates: Vec<PortfolioCandidate>,
}

/// Monte Carlo maximum-Sharpe search: weights are drawn uniformly, normalized
/// onto the simplex, and the best-scoring sample is kept.
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Samples the configured number of portfolios and returns the one with the
    /// highest Sharpe ratio. Ties keep the earliest sample.
    pub fn optimize(&self, assets: &[AssetReturns]) -> Result<OptimizationResult> {
        self.run(assets).map(|run| run.result)
    }

    /// Every sampled candidate, in draw order.
    pub fn sample_portfolios(&self, assets: &[AssetReturns]) -> Result<Vec<PortfolioCandidate>> {
        self.run(assets).map(|run| run.candidates)
    }

    /// Best candidate together with the full sample it was selected from.
    pub fn run(&self, assets: &[AssetReturns]) -> Result<OptimizationRun> {
        self.validate(assets)?;
        let tickers: Vec<String> = assets.iter().map(|a| a.ticker.clone()).collect();
        let stats = PortfolioStatistics::from_returns(assets);

        if assets.len() == 1 {
            info!(
                "Single asset {} supplied; allocating the full weight without sampling.",
                tickers[0]
            );
            let candidate = self.evaluate(&stats, vec![1.0]);
            return Ok(OptimizationRun {
                result: OptimizationResult::from_candidate(
                    tickers,
                    candidate.clone(),
                    self.config.risk_free_rate,
                    0,
                ),
                candidates: vec![candidate],
            });
        }

        let candidates = self.sample_with_stats(&stats);
        let best = candidates
            .get(select_best(&candidates))
            .cloned()
            .ok_or_else(|| PortfolioError::invalid_input("no portfolios were sampled"))?;

        info!(
            "Best of {} sampled portfolios: Sharpe {:.4}, return {:.2}%, volatility {:.2}%.",
            candidates.len(),
            best.sharpe_ratio,
            best.expected_return * 100.0,
            best.volatility * 100.0
        );
        Ok(OptimizationRun {
            result: OptimizationResult::from_candidate(
                tickers,
                best,
                self.config.risk_free_rate,
                candidates.len(),
            ),
            candidates,
        })
    }

    pub fn evaluate(&self, stats: &PortfolioStatistics, weights: Vec<f64>) -> PortfolioCandidate {
        let expected_return = stats.expected_return(&weights);
        let volatility = stats.volatility(&weights);
        PortfolioCandidate {
            sharpe_ratio: sharpe_ratio(expected_return, volatility, self.config.risk_free_rate),
            weights,
            expected_return,
            volatility,
        }
    }

    fn sample_with_stats(&self, stats: &PortfolioStatistics) -> Vec<PortfolioCandidate> {
        let sample_count = self.config.num_portfolios;
        let asset_count = stats.asset_count();
        let mut rng = build_rng(self.config.seed);
        info!(
            "Sampling {} portfolios over {} assets (seed: {}, parallel: {})",
            sample_count,
            asset_count,
            self.config
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "entropy".to_string()),
            self.config.parallel
        );

        let pb = self.progress_bar(sample_count);
        let candidates: Vec<PortfolioCandidate> = if self.config.parallel {
            // Draws stay on one RNG so the parallel path matches the serial one.
            let weight_sets: Vec<Vec<f64>> = (0..sample_count)
                .map(|_| random_weights(&mut rng, asset_count))
                .collect();
            debug!(
                "Evaluating candidates on {} rayon threads",
                rayon::current_num_threads()
            );
            weight_sets
                .into_par_iter()
                .map(|weights| {
                    let candidate = self.evaluate(stats, weights);
                    pb.inc(1);
                    candidate
                })
                .collect()
        } else {
            (0..sample_count)
                .map(|_| {
                    let candidate = self.evaluate(stats, random_weights(&mut rng, asset_count));
                    pb.inc(1);
                    candidate
                })
                .collect()
        };
        pb.finish_and_clear();

        let degenerate = candidates
            .iter()
            .filter(|c| c.sharpe_ratio == f64::NEG_INFINITY)
            .count();
        if degenerate > 0 {
            debug!(
                "{} sampled portfolio(s) had an undefined Sharpe ratio",
                degenerate
            );
        }
        candidates
    }

    fn validate(&self, assets: &[AssetReturns]) -> Result<()> {
        if self.config.num_portfolios == 0 {
            return Err(PortfolioError::invalid_input(
                "sample count must be positive",
            ));
        }
        if !self.config.risk_free_rate.is_finite() {
            return Err(PortfolioError::invalid_input(format!(
                "risk-free rate must be finite (value: {})",
                self.config.risk_free_rate
            )));
        }
        let Some(first) = assets.first() else {
            return Err(PortfolioError::invalid_input(
                "at least one asset is required",
            ));
        };

        let mut seen = HashSet::new();
        for asset in assets {
            if !seen.insert(asset.ticker.as_str()) {
                return Err(PortfolioError::invalid_input(format!(
                    "duplicate asset {}",
                    asset.ticker
                )));
            }
        }

        let expected_len = first.returns.len();
        if let Some(mismatch) = assets.iter().find(|a| a.returns.len() != expected_len) {
            return Err(PortfolioError::invalid_input(format!(
                "return series for {} has {} observations but {} has {}",
                mismatch.ticker,
                mismatch.returns.len(),
                first.ticker,
                expected_len
            )));
        }
        if expected_len < 2 {
            return Err(PortfolioError::invalid_input(format!(
                "at least 2 return observations are required (got {})",
                expected_len
            )));
        }
        if let Some(asset) = assets
            .iter()
            .find(|a| a.returns.iter().any(|r| !r.is_finite()))
        {
            return Err(PortfolioError::invalid_input(format!(
                "return series for {} contains non-finite values",
                asset.ticker
            )));
        }
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Index of the first candidate with the highest Sharpe ratio.
fn select_best(candidates: &[PortfolioCandidate]) -> usize {
    let mut best_idx = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.sharpe_ratio > best_score {
            best_idx = idx;
            best_score = candidate.sharpe_ratio;
        }
    }
    best_idx
}
