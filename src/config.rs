use std::env;
use std::path::PathBuf;

/// Retry and backoff settings for upstream queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay in milliseconds (doubles with each retry).
    pub base_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Add up to 25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 500,
            max_backoff_ms: 8_000,
            jitter: false,
        }
    }
}

/// Scan sizing limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Rows fetched for universe-wide scans (bollinger, rating, volume).
    pub universe_limit: usize,
    /// Candles of history requested per symbol for pattern scans.
    pub candle_lookback: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            universe_limit: 500,
            candle_lookback: 8,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Upstream screener base URL.
    pub screener_api_url: String,
    /// Per-request upstream timeout.
    pub request_timeout_secs: u64,
    /// Directory holding `<exchange>.txt` symbol lists.
    pub coinlist_dir: PathBuf,
    pub retry: RetryConfig,
    pub scan: ScanConfig,
    /// Verbose default logging.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            screener_api_url: "https://scanner.tradingview.com".to_string(),
            request_timeout_secs: 15,
            coinlist_dir: PathBuf::from("coinlist"),
            retry: RetryConfig::default(),
            scan: ScanConfig::default(),
            debug: false,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim(), "true" | "1" | "yes"))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let retry = RetryConfig {
            max_retries: parsed("SCREENER_MAX_RETRIES").unwrap_or(defaults.retry.max_retries),
            base_backoff_ms: parsed("SCREENER_BASE_BACKOFF_MS")
                .unwrap_or(defaults.retry.base_backoff_ms),
            max_backoff_ms: parsed("SCREENER_MAX_BACKOFF_MS")
                .unwrap_or(defaults.retry.max_backoff_ms),
            jitter: flag("SCREENER_BACKOFF_JITTER").unwrap_or(defaults.retry.jitter),
        };

        let scan = ScanConfig {
            universe_limit: parsed("SCAN_UNIVERSE_LIMIT")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.scan.universe_limit),
            candle_lookback: parsed("CANDLE_LOOKBACK")
                .filter(|v: &usize| *v >= 2)
                .unwrap_or(defaults.scan.candle_lookback),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            screener_api_url: env::var("SCREENER_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.screener_api_url),
            request_timeout_secs: parsed("SCREENER_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            coinlist_dir: env::var("COINLIST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.coinlist_dir),
            retry,
            scan,
            debug: env::var("DEBUG_SCREENER").is_ok(),
        }
    }
}
