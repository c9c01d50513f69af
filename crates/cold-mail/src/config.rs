use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
// Workspace `data/` directory, resolved at build time rather than against the working directory.
const DEFAULT_BUILTIN_PORTFOLIO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/portfolio.csv");
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded explicitly from environment variables.
///
/// Chat API settings (`OPENAI_*`) are read separately by
/// `outreach_common::openai::OpenAiClientConfig::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path to the LanceDB data directory holding the portfolio table.
    pub lancedb_path: String,
    /// CSV used when a request selects the built-in portfolio.
    pub builtin_portfolio: PathBuf,
    /// Chat model id used for both extraction and drafting.
    pub model: String,
    /// Timeout for loading the careers page.
    pub fetch_timeout: Duration,
    /// Where fastembed keeps downloaded models. `None` uses fastembed's default.
    pub embedding_cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LANCEDB_PATH`: path to LanceDB data directory
    ///
    /// Optional:
    /// - `COLD_MAIL_BUILTIN_PORTFOLIO` (default: the workspace's `data/portfolio.csv`)
    /// - `COLD_MAIL_MODEL` (default: "llama-3.1-70b-versatile")
    /// - `FETCH_TIMEOUT_SECS` (default: 30)
    /// - `FASTEMBED_CACHE_DIR`
    pub fn from_env() -> Result<Self, AppError> {
        let lancedb_path = std::env::var("LANCEDB_PATH").map_err(|_| {
            AppError::Config("LANCEDB_PATH environment variable is required".to_string())
        })?;

        let builtin_portfolio = std::env::var("COLD_MAIL_BUILTIN_PORTFOLIO")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BUILTIN_PORTFOLIO));

        let model = std::env::var("COLD_MAIL_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let fetch_timeout = match std::env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                AppError::Config(format!("FETCH_TIMEOUT_SECS must be a number of seconds, got {raw:?}"))
            })?,
            Err(_) => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        Ok(Self {
            lancedb_path,
            builtin_portfolio,
            model,
            fetch_timeout,
            embedding_cache_dir: std::env::var("FASTEMBED_CACHE_DIR").ok().map(PathBuf::from),
        })
    }
}
