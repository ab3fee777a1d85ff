//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ports::{QueueError, StatusError};
use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = errno::BAD_REQUEST, error = %msg, "Bad request");
                ErrorResponse::new(errno::BAD_REQUEST, msg.clone())
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = errno::INTERNAL_ERROR, error = %msg, "Internal server error");
                ErrorResponse::new(errno::INTERNAL_ERROR, msg.clone())
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = errno::SERVICE_UNAVAILABLE, error = %msg, "Service unavailable");
                ErrorResponse::new(errno::SERVICE_UNAVAILABLE, msg.clone())
            }
        };

        (StatusCode::OK, Json(response)).into_response()
    }
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::HandlerFailed { id, source } => {
                tracing::debug!(id, error = %source, "Queued request failed");
                source.into()
            }
            QueueError::Dropped(id) => ApiError::Internal(QueueError::Dropped(id).to_string()),
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(e: StatusError) -> Self {
        ApiError::ServiceUnavailable(format!("Printer status unavailable: {}", e))
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::InvalidState(msg) => ApiError::BadRequest(msg),
            ApplicationError::Capture(_) | ApplicationError::Analysis(_) => {
                ApiError::ServiceUnavailable(e.to_string())
            }
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CaptureError, RequestHandler, RequestKind, RequestOutcome, RequestQueuePort,
    };
    use crate::infrastructure::memory::InMemoryRequestQueue;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct RejectingHandler;

    #[async_trait]
    impl RequestHandler for RejectingHandler {
        async fn handle(&self, kind: RequestKind) -> Result<RequestOutcome, ApplicationError> {
            match kind {
                RequestKind::Frame => Err(CaptureError::Timeout.into()),
                _ => Err(ApplicationError::invalid_state("Vision analysis is disabled")),
            }
        }
    }

    fn queue() -> InMemoryRequestQueue {
        InMemoryRequestQueue::with_pause(Arc::new(RejectingHandler), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_invalid_state_from_queue_maps_to_bad_request() {
        let err = queue().enqueue(RequestKind::Status).await.unwrap_err();

        match ApiError::from(err) {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Vision analysis is disabled"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_failure_from_queue_maps_to_unavailable() {
        let err = queue().enqueue(RequestKind::Frame).await.unwrap_err();

        match ApiError::from(err) {
            ApiError::ServiceUnavailable(msg) => assert!(msg.starts_with("Capture error")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_dropped_request_maps_to_internal() {
        assert!(matches!(
            ApiError::from(QueueError::Dropped(4)),
            ApiError::Internal(_)
        ));
    }
}
