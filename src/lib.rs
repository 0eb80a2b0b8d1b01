pub mod commands;
pub mod config;
pub mod data_loader;
pub mod decomposition;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod preprocess;
pub mod report;
pub mod returns;
pub mod rolling;

pub use error::{PortfolioError, Result};
pub use models::{AssetReturns, OptimizationResult, PortfolioCandidate, PriceSeries};
pub use optimizer::PortfolioOptimizer;
