//! Monitor Command Handlers
//!
//! 按需命令：status / analyze / frame，全部经过请求队列

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::ports::{RequestKind, RequestOutcome};
use crate::infrastructure::http::dto::{AnalysisResponse, ApiResponse, StatsResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

async fn run_analysis(
    state: &AppState,
    kind: RequestKind,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    if !state.vision_enabled {
        return Err(ApiError::BadRequest("Vision analysis is disabled".to_string()));
    }

    tracing::info!(kind = kind.as_str(), pending = state.queue.pending(), "Command received");

    match state.queue.enqueue(kind).await? {
        RequestOutcome::Report(report) => Ok(Json(ApiResponse::success(
            AnalysisResponse::from_report(report, state.notification_threshold),
        ))),
        RequestOutcome::Frame(_) => Err(ApiError::Internal(
            "Unexpected frame outcome for analysis request".to_string(),
        )),
    }
}

/// 采集并分析当前画面
pub async fn status_command(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    run_analysis(&state, RequestKind::Status).await
}

/// 采集、分析并附带打印机状态
pub async fn analyze_command(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    run_analysis(&state, RequestKind::Analyze).await
}

/// 仅采集，返回 JPEG
pub async fn frame_command(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match state.queue.enqueue(RequestKind::Frame).await? {
        RequestOutcome::Frame(frame) => {
            Ok(([(header::CONTENT_TYPE, "image/jpeg")], frame.data).into_response())
        }
        RequestOutcome::Report(_) => Err(ApiError::Internal(
            "Unexpected report outcome for frame request".to_string(),
        )),
    }
}

/// 运行统计
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.stats.borrow().clone();
    Json(ApiResponse::success(StatsResponse::new(
        stats,
        state.queue.pending(),
    )))
}
