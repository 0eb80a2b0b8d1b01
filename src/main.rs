use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use portfolio_engine::commands::{
    decompose, optimize, returns, rolling, MissingValuePolicy,
};
use portfolio_engine::config::{
    parse_ticker_list, settings_from_env, DataSettings, OptimizerConfig, DEFAULT_TICKERS,
};
use portfolio_engine::rolling::DEFAULT_ROLLING_WINDOW;
use std::path::PathBuf;

const DEFAULT_DECOMPOSITION_PERIOD: usize = 252;

#[derive(Parser)]
#[command(name = "portfolio-engine")]
#[command(about = "Daily price analysis and Monte Carlo portfolio optimization")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory containing one {TICKER}.csv file per asset (overrides DATA_DIR)
    #[arg(long = "data-dir", value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,
    /// Price column to read (overrides PRICE_COLUMN)
    #[arg(long = "price-column", global = true)]
    price_column: Option<String>,
    /// Treatment of missing closing prices
    #[arg(long, value_enum, default_value_t = MissingValuePolicy::Keep, global = true)]
    missing: MissingValuePolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// Search random long-only portfolios for the maximum Sharpe ratio
    Optimize {
        /// Comma or space separated tickers (defaults to TSLA,BND,SPY)
        #[arg(value_delimiter = ',', num_args = 0..)]
        tickers: Vec<String>,
        /// Number of random portfolios to sample (overrides NUM_PORTFOLIOS)
        #[arg(long)]
        samples: Option<usize>,
        /// Annual risk-free rate (overrides RISK_FREE_RATE)
        #[arg(long = "risk-free-rate")]
        risk_free_rate: Option<f64>,
        /// Seed for reproducible sampling (overrides RANDOM_SEED)
        #[arg(long)]
        seed: Option<u64>,
        /// Evaluate sampled portfolios in parallel
        #[arg(long)]
        parallel: bool,
        /// Show a progress bar while sampling
        #[arg(long)]
        progress: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Write every sampled portfolio to a CSV file
        #[arg(long = "candidates-output", value_name = "PATH")]
        candidates_output: Option<PathBuf>,
    },
    /// Print annualized return and volatility per ticker
    Returns {
        /// Comma or space separated tickers (defaults to TSLA,BND,SPY)
        #[arg(value_delimiter = ',', num_args = 0..)]
        tickers: Vec<String>,
    },
    /// Rolling mean and standard deviation of closing prices as CSV
    Rolling {
        ticker: String,
        #[arg(long, default_value_t = DEFAULT_ROLLING_WINDOW)]
        window: usize,
        #[arg(short, long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Additive seasonal decomposition of closing prices as CSV
    Decompose {
        ticker: String,
        #[arg(long, default_value_t = DEFAULT_DECOMPOSITION_PERIOD)]
        period: usize,
        #[arg(short, long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let Cli { data, command } = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings_from_env();
    let mut data_settings = DataSettings::from_settings_map(&settings);
    if let Some(data_dir) = data.data_dir {
        data_settings.data_dir = data_dir;
    }
    if let Some(price_column) = data.price_column {
        data_settings.price_column = price_column;
    }

    match command {
        Commands::Optimize {
            tickers,
            samples,
            risk_free_rate,
            seed,
            parallel,
            progress,
            json,
            candidates_output,
        } => {
            let mut config = OptimizerConfig::from_settings_map(&settings)?;
            if let Some(samples) = samples {
                config.num_portfolios = samples;
            }
            if let Some(rate) = risk_free_rate {
                config.risk_free_rate = rate;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            config.parallel |= parallel;
            config.show_progress = progress;

            optimize::run(&optimize::OptimizeOptions {
                tickers: resolve_tickers(&tickers)?,
                data: data_settings,
                config,
                missing: data.missing,
                json,
                candidates_output,
            })?;
        }
        Commands::Returns { tickers } => {
            returns::run(&resolve_tickers(&tickers)?, &data_settings, data.missing)?;
        }
        Commands::Rolling {
            ticker,
            window,
            output,
        } => {
            rolling::run(
                &ticker,
                window,
                &data_settings,
                data.missing,
                output.as_deref(),
            )?;
        }
        Commands::Decompose {
            ticker,
            period,
            output,
        } => {
            decompose::run(
                &ticker,
                period,
                &data_settings,
                data.missing,
                output.as_deref(),
            )?;
        }
    }

    info!("Done.");
    Ok(())
}

fn resolve_tickers(raw: &[String]) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect());
    }
    let tickers = parse_ticker_list(&raw.join(","));
    if tickers.is_empty() {
        return Err(anyhow!("No tickers supplied"));
    }
    Ok(tickers)
}
