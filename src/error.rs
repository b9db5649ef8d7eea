use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by screener and pattern operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScreenerError {
    #[error("Unknown exchange: {0}")]
    InvalidExchange(String),

    #[error("Unsupported timeframe: {0} (expected one of 5m, 15m, 1h, 4h, 1D, 1W, 1M)")]
    InvalidTimeframe(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Market data unavailable after {attempts} attempt(s): {reason}")]
    DataUnavailable { attempts: u32, reason: String },

    #[error("Indeterminate field {field} for {symbol}")]
    IndeterminateField { symbol: String, field: String },
}

impl ScreenerError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScreenerError::InvalidExchange(_) => ErrorKind::InvalidExchange,
            ScreenerError::InvalidTimeframe(_) => ErrorKind::InvalidTimeframe,
            ScreenerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ScreenerError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            ScreenerError::IndeterminateField { .. } => ErrorKind::IndeterminateField,
        }
    }

    /// Whether a caller may reasonably try the same request again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScreenerError::DataUnavailable { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ScreenerError::InvalidExchange(_)
            | ScreenerError::InvalidTimeframe(_)
            | ScreenerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ScreenerError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ScreenerError::IndeterminateField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidExchange,
    InvalidTimeframe,
    InvalidArgument,
    DataUnavailable,
    IndeterminateField,
}

/// Failures reported by an upstream market source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode upstream response: {0}")]
    Decode(String),

    #[error("Upstream rejected market or exchange: {0}")]
    InvalidMarket(String),
}

impl SourceError {
    /// Transient conditions worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Timeout | SourceError::RateLimited { .. } | SourceError::Transport(_) => {
                true
            }
            SourceError::Http { status } => *status >= 500,
            SourceError::Decode(_) | SourceError::InvalidMarket(_) => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            SourceError::Http {
                status: status.as_u16(),
            }
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
