//! API 에러 처리.
//!
//! 모든 에러 응답 본문은 `{error, details?}` 형태다.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use studyhub_core::error::{CallFailure, CoreError};

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청
    #[error("잘못된 요청: {0}")]
    BadRequest(String),

    /// 업스트림 AI 호출 실패
    #[error("{error} ({status}): {details}")]
    Upstream {
        status: StatusCode,
        error: String,
        details: String,
    },

    /// 내부 서버 오류
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// 업스트림 실패를 응답으로 변환.
    ///
    /// HTTP 실패는 업스트림 상태 코드를 그대로, 전송 계층/본문 파싱 실패는 502.
    pub fn upstream(error: impl Into<String>, failure: &CallFailure) -> Self {
        let status = failure
            .status()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY);

        ApiError::Upstream {
            status,
            error: error.into(),
            details: failure.details(),
        }
    }

    /// 상세 정보가 있는 내부 오류
    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// 상세 정보 (업스트림 응답 원문 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(error) => ErrorResponse {
                error,
                details: None,
            },
            ApiError::Upstream { error, details, .. } => ErrorResponse {
                error,
                details: Some(details),
            },
            ApiError::Internal { error, details } => ErrorResponse { error, details },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::internal("Internal server error", err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
