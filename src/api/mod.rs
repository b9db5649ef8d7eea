pub mod health;
pub mod patterns;
pub mod screener;

use crate::error::{ErrorKind, ScreenerError};
use crate::AppState;
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;

/// Uniform envelope for every operation: exactly one of `data` / `error`.
#[derive(Debug, Serialize)]
pub struct ToolResponse<T> {
    pub data: Option<T>,
    pub error: Option<ToolError>,
    pub meta: ResponseMeta,
    #[serde(skip)]
    status: StatusCode,
}

#[derive(Debug, Serialize)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    /// The caller may repeat the same request later.
    pub retryable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub timestamp: i64,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl<T: Serialize> ToolResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            meta: ResponseMeta::now(),
            status: StatusCode::OK,
        }
    }

    pub fn err(error: ScreenerError) -> Self {
        Self {
            data: None,
            status: error.status_code(),
            error: Some(ToolError {
                kind: error.kind(),
                message: error.to_string(),
                retryable: error.is_retryable(),
            }),
            meta: ResponseMeta::now(),
        }
    }

    pub fn from_result(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "Request failed: {}", e);
                Self::err(e)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ToolResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Malformed query strings become `InvalidArgument` envelopes.
pub(crate) fn invalid_query(rejection: QueryRejection) -> ScreenerError {
    ScreenerError::InvalidArgument(rejection.body_text())
}

/// Split a comma-separated list, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/screener", screener::router())
        .nest("/api/patterns", patterns::router())
        .merge(screener::exchanges_router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let response = ToolResponse::ok(vec![1, 2, 3]);
        assert_eq!(response.status(), StatusCode::OK);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"][2], 3);
        assert!(json["error"].is_null());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response: ToolResponse<()> = ToolResponse::err(ScreenerError::DataUnavailable {
            attempts: 4,
            reason: "upstream returned no rows".into(),
        });
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["kind"], "data_unavailable");
        assert_eq!(json["error"]["retryable"], true);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("15m, 1h,,4h "), vec!["15m", "1h", "4h"]);
        assert!(split_list("").is_empty());
    }
}
