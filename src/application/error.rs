//! 应用层错误定义
//!
//! 统一的监控流程错误类型

use thiserror::Error;

use super::ports::{AnalysisError, CaptureError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 帧采集失败
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// 视觉分析失败
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}
