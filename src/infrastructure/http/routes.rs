//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                GET   健康检查
//! - /api/monitor/status      POST  采集 + 分析
//! - /api/monitor/analyze     POST  采集 + 分析 + 打印机状态
//! - /api/monitor/frame       GET   采集一帧（image/jpeg）
//! - /api/monitor/stats       GET   运行统计
//! - /api/printer/status      GET   打印机状态
//! - /ws/events               WS    监控事件流

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/monitor", monitor_routes())
        .route("/printer/status", get(handlers::printer_status))
}

/// Monitor 路由
fn monitor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", post(handlers::status_command))
        .route("/analyze", post(handlers::analyze_command))
        .route("/frame", get(handlers::frame_command))
        .route("/stats", get(handlers::get_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AnalysisError, FrameCapture, InspectionReport, MachineStatusPort, QueueError, RequestKind,
        RequestOutcome, RequestQueuePort, StatusError,
    };
    use crate::domain::analysis::parse_analysis_response;
    use crate::domain::machine::MachineStatusSnapshot;
    use crate::domain::RunningStatistics;
    use crate::infrastructure::events::EventPublisher;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tokio::sync::watch;
    use tower::util::ServiceExt;

    const JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

    struct CannedQueue;

    #[async_trait]
    impl RequestQueuePort for CannedQueue {
        async fn enqueue(&self, kind: RequestKind) -> Result<RequestOutcome, QueueError> {
            let frame = FrameCapture::new(JPEG.to_vec());
            match kind {
                RequestKind::Frame => Ok(RequestOutcome::Frame(frame)),
                RequestKind::Analyze => Err(QueueError::HandlerFailed {
                    id: 9,
                    source: AnalysisError::Timeout.into(),
                }),
                _ => Ok(RequestOutcome::Report(InspectionReport {
                    frame,
                    analysis: parse_analysis_response(
                        r#"{"overall_status": "warning", "problems": [
                            {"issue": "blob", "confidence": 0.85},
                            {"issue": "gap", "confidence": 0.5}
                        ]}"#,
                    ),
                    machine_status: None,
                })),
            }
        }

        fn pending(&self) -> usize {
            0
        }
    }

    struct IdlePrinter;

    #[async_trait]
    impl MachineStatusPort for IdlePrinter {
        async fn get_status(&self) -> Result<MachineStatusSnapshot, StatusError> {
            Ok(MachineStatusSnapshot::with_machine_code(0))
        }
    }

    fn app(vision_enabled: bool) -> Router {
        let (_tx, rx) = watch::channel(RunningStatistics::new());
        let state = AppState::new(
            Arc::new(CannedQueue),
            Arc::new(IdlePrinter),
            rx,
            EventPublisher::new().arc(),
            vision_enabled,
            0.8,
        );
        create_routes().with_state(Arc::new(state))
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call_json(app: Router, method: &str, uri: &str) -> Value {
        let (status, body) = call(app, method, uri).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let body = call_json(app(true), "GET", "/api/ping").await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["vision_enabled"], true);
    }

    #[tokio::test]
    async fn test_status_command_returns_analysis() {
        let body = call_json(app(true), "POST", "/api/monitor/status").await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["overall_status"], "warning");
        assert_eq!(body["data"]["problems"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["alerting_problems"], 1);
        assert_eq!(body["data"]["image_bytes"], 4);
    }

    #[tokio::test]
    async fn test_status_command_rejected_when_vision_disabled() {
        let body = call_json(app(false), "POST", "/api/monitor/status").await;
        assert_eq!(body["errno"], 400);
        assert_eq!(body["error"], "Vision analysis is disabled");
    }

    #[tokio::test]
    async fn test_failed_request_reports_error() {
        let body = call_json(app(true), "POST", "/api/monitor/analyze").await;
        assert_eq!(body["errno"], 503);
        assert_eq!(body["error"], "Analysis error: Request timeout");
    }

    #[tokio::test]
    async fn test_frame_command_returns_jpeg() {
        let request = Request::builder()
            .uri("/api/monitor/frame")
            .body(Body::empty())
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), &JPEG[..]);
    }

    #[tokio::test]
    async fn test_stats_and_printer_status() {
        let stats = call_json(app(true), "GET", "/api/monitor/stats").await;
        assert_eq!(stats["data"]["stats"]["frames_processed"], 0);
        assert_eq!(stats["data"]["queue_pending"], 0);

        let printer = call_json(app(true), "GET", "/api/printer/status").await;
        assert_eq!(printer["data"]["printing"], false);
        assert_eq!(printer["data"]["snapshot"]["machine"]["text"], "Idle");
    }
}
