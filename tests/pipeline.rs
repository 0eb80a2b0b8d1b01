use anyhow::Result;
use chrono::{Duration, NaiveDate};
use portfolio_engine::commands::{optimize, rolling, MissingValuePolicy};
use portfolio_engine::config::{parse_ticker_list, DataSettings, OptimizerConfig};
use portfolio_engine::data_loader::{load_asset_data, DEFAULT_PRICE_COLUMN};
use portfolio_engine::optimizer::PortfolioOptimizer;
use portfolio_engine::report::render_optimization_report;
use portfolio_engine::returns::compute_returns;
use portfolio_engine::PortfolioError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fmt::Write;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

const TRADING_DAYS: usize = 252;
const SAMPLES: usize = 1000;
const SEED: u64 = 42;

struct SyntheticAsset {
    ticker: &'static str,
    start_price: f64,
    daily_mean: f64,
    daily_std: f64,
}

const ASSETS: [SyntheticAsset; 3] = [
    SyntheticAsset {
        ticker: "TSLA",
        start_price: 250.0,
        daily_mean: 0.0015,
        daily_std: 0.035,
    },
    SyntheticAsset {
        ticker: "BND",
        start_price: 72.0,
        daily_mean: 0.0001,
        daily_std: 0.003,
    },
    SyntheticAsset {
        ticker: "SPY",
        start_price: 470.0,
        daily_mean: 0.0006,
        daily_std: 0.011,
    },
];

fn ensure_test_env() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Writes `{ticker}.csv` with `TRADING_DAYS + 1` closes driven by normal daily returns.
fn write_synthetic_csv(dir: &Path, asset: &SyntheticAsset, seed: u64) -> Result<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(asset.daily_mean, asset.daily_std)?;

    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    let mut price = asset.start_price;
    let mut returns = Vec::with_capacity(TRADING_DAYS);
    for day in 0..=TRADING_DAYS {
        if day > 0 {
            let r: f64 = normal.sample(&mut rng);
            returns.push(r);
            price *= 1.0 + r;
        }
        let date = start_date() + Duration::days(day as i64);
        writeln!(
            csv,
            "{},{p},{p},{p},{p},1000",
            date.format("%Y-%m-%d"),
            p = price
        )?;
    }
    fs::write(dir.join(format!("{}.csv", asset.ticker)), csv)?;
    Ok(returns)
}

fn seeded_config() -> OptimizerConfig {
    OptimizerConfig {
        num_portfolios: SAMPLES,
        seed: Some(SEED),
        ..OptimizerConfig::default()
    }
}

#[test]
fn end_to_end_optimization_is_reproducible() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    let mut generated = Vec::new();
    for (idx, asset) in ASSETS.iter().enumerate() {
        generated.push(write_synthetic_csv(dir.path(), asset, 100 + idx as u64)?);
    }

    let tickers: Vec<&str> = ASSETS.iter().map(|a| a.ticker).collect();
    let series = load_asset_data(&tickers, dir.path(), DEFAULT_PRICE_COLUMN)?;
    let table = compute_returns(&series)?;
    assert_eq!(table.len(), TRADING_DAYS);
    for (asset, expected) in table.assets().iter().zip(&generated) {
        for (actual, expected) in asset.returns.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-9);
        }
    }

    let first = PortfolioOptimizer::new(seeded_config()).run(table.assets())?;
    let second = PortfolioOptimizer::new(seeded_config()).optimize(table.assets())?;

    assert_eq!(first.candidates.len(), SAMPLES);
    assert_eq!(first.result.samples_evaluated, SAMPLES);
    assert_eq!(first.result.tickers, vec!["TSLA", "BND", "SPY"]);
    assert!((first.result.sharpe_ratio - second.sharpe_ratio).abs() < 1e-12);
    assert_eq!(first.result.weights, second.weights);

    for candidate in &first.candidates {
        assert!(candidate.weights.iter().all(|w| *w >= 0.0));
        assert!((candidate.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(candidate.sharpe_ratio <= first.result.sharpe_ratio);
    }

    let report = render_optimization_report(&first.result);
    assert!(report.starts_with("Optimal Weights:\nTSLA: "));
    assert!(report.contains("\nSharpe Ratio: "));
    Ok(())
}

#[test]
fn parallel_sampling_matches_serial_sampling() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    for (idx, asset) in ASSETS.iter().enumerate() {
        write_synthetic_csv(dir.path(), asset, 7 + idx as u64)?;
    }
    let series = load_asset_data(&["TSLA", "BND", "SPY"], dir.path(), DEFAULT_PRICE_COLUMN)?;
    let table = compute_returns(&series)?;

    let serial = PortfolioOptimizer::new(seeded_config()).optimize(table.assets())?;
    let parallel = PortfolioOptimizer::new(OptimizerConfig {
        parallel: true,
        ..seeded_config()
    })
    .optimize(table.assets())?;

    assert_eq!(serial, parallel);
    Ok(())
}

#[test]
fn missing_asset_file_aborts_loading() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    write_synthetic_csv(dir.path(), &ASSETS[0], 1)?;

    let err = load_asset_data(&["TSLA", "BND"], dir.path(), DEFAULT_PRICE_COLUMN).unwrap_err();
    assert!(matches!(err, PortfolioError::FileNotFound { ref ticker, .. } if ticker == "BND"));
    Ok(())
}

#[test]
fn optimize_command_writes_candidate_cloud() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    for (idx, asset) in ASSETS.iter().enumerate() {
        write_synthetic_csv(dir.path(), asset, 20 + idx as u64)?;
    }
    let candidates_path = dir.path().join("frontier.csv");

    optimize::run(&optimize::OptimizeOptions {
        tickers: vec!["TSLA".to_string(), "BND".to_string(), "SPY".to_string()],
        data: DataSettings {
            data_dir: dir.path().to_path_buf(),
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
        },
        config: OptimizerConfig {
            num_portfolios: 50,
            seed: Some(SEED),
            ..OptimizerConfig::default()
        },
        missing: MissingValuePolicy::FillMean,
        json: true,
        candidates_output: Some(candidates_path.clone()),
    })?;

    let written = fs::read_to_string(&candidates_path)?;
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("return,volatility,sharpe,TSLA,BND,SPY")
    );
    assert_eq!(lines.count(), 50);
    Ok(())
}

#[test]
fn misaligned_dates_are_inner_joined() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    fs::write(
        dir.path().join("AAA.csv"),
        "Date,Close\n2024-01-02,10\n2024-01-03,11\n2024-01-04,12\n2024-01-05,13\n",
    )?;
    fs::write(
        dir.path().join("BBB.csv"),
        "Date,Close\n2024-01-02,20\n2024-01-04,21\n2024-01-05,22\n2024-01-08,23\n",
    )?;

    let series = load_asset_data(&["AAA", "BBB"], dir.path(), DEFAULT_PRICE_COLUMN)?;
    let table = compute_returns(&series)?;
    assert_eq!(
        table.dates(),
        &[
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        ]
    );
    assert_eq!(table.assets()[0].returns.len(), table.assets()[1].returns.len());
    Ok(())
}

#[test]
fn rolling_command_skips_blank_closes() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    let mut csv = String::from("Date,Close\n");
    for day in 0..48 {
        let date = start_date() + Duration::days(day);
        if day == 10 {
            writeln!(csv, "{},", date.format("%Y-%m-%d"))?;
        } else {
            writeln!(csv, "{},{}", date.format("%Y-%m-%d"), 400.0 + day as f64)?;
        }
    }
    fs::write(dir.path().join("SPY.csv"), csv)?;
    let output = dir.path().join("spy_rolling.csv");

    rolling::run(
        "SPY",
        30,
        &DataSettings {
            data_dir: dir.path().to_path_buf(),
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
        },
        MissingValuePolicy::Keep,
        Some(&output),
    )?;

    let written = fs::read_to_string(&output)?;
    let rows: Vec<&str> = written.lines().skip(1).collect();
    assert_eq!(rows.len(), 47);
    assert_eq!(rows.iter().filter(|row| !row.ends_with(",,")).count(), 18);
    Ok(())
}

#[test]
fn tickers_keep_their_case_for_file_lookup() -> Result<()> {
    ensure_test_env();
    let dir = tempdir()?;
    fs::write(
        dir.path().join("spy.csv"),
        "Date,Close\n2024-01-02,10\n2024-01-03,11\n",
    )?;

    let tickers = parse_ticker_list("spy");
    let series = load_asset_data(&tickers, dir.path(), DEFAULT_PRICE_COLUMN)?;
    assert_eq!(series[0].ticker(), "spy");
    assert_eq!(series[0].len(), 2);
    Ok(())
}
