//! API response types and error codes
//!
//! All responses share one envelope:
//! - code: 0 = success, non-zero = error code
//! - msg: short message description
//! - data: actual data (success) or absent (error)

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::EngineError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Success shorthand for handlers
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const CURRENCY_MISMATCH: i32 = 1003;
    pub const INVALID_STATE: i32 = 1004;
    pub const DAILY_LIMIT_EXCEEDED: i32 = 1005;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Handler error carrying an HTTP status and an envelope error code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            msg,
        )
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_AUTH, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()> {
            code: self.code,
            msg: self.msg,
            data: None,
        });
        (self.status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let msg = e.to_string();
        match e {
            EngineError::InvalidRequest(_) => Self::bad_request(msg),
            EngineError::NotFound(_) => Self::not_found(msg),
            EngineError::InvalidState(_) => Self::new(
                StatusCode::CONFLICT,
                error_codes::INVALID_STATE,
                msg,
            ),
            EngineError::CurrencyMismatch { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                error_codes::CURRENCY_MISMATCH,
                msg,
            ),
            EngineError::InsufficientBalance(_) => Self::new(
                StatusCode::BAD_REQUEST,
                error_codes::INSUFFICIENT_BALANCE,
                msg,
            ),
            EngineError::DailyLimitExceeded { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                error_codes::DAILY_LIMIT_EXCEEDED,
                msg,
            ),
            EngineError::Conflict(_) => {
                Self::new(StatusCode::CONFLICT, error_codes::CONFLICT, msg)
            }
            EngineError::Database(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "internal error",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::success("payload");
        assert_eq!(response.code, 0);
        assert_eq!(response.msg, "ok");
        assert_eq!(response.data, Some("payload"));
    }

    #[test]
    fn test_engine_error_mapping() {
        let err = ApiError::from(EngineError::NotFound("wallet WAL-1".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::NOT_FOUND);

        let err = ApiError::from(EngineError::DailyLimitExceeded {
            limit: Decimal::from(1000),
            used: Decimal::from(900),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::DAILY_LIMIT_EXCEEDED);

        // Database detail never leaks to the caller
        let err = ApiError::from(EngineError::Database(sqlx::Error::PoolClosed));
        assert_eq!(err.msg, "internal error");
    }
}
