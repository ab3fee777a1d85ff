//! Printer Status Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, PrinterStatusResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 直接查询打印机状态（不经过队列，不占用视觉通道）
pub async fn printer_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PrinterStatusResponse>>, ApiError> {
    let snapshot = state.status_source.get_status().await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}
