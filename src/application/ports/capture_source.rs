//! Capture Source Port - 摄像头帧采集抽象
//!
//! 定义单次帧采集的接口，重试由应用层负责

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 采集错误
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Capture timeout")]
    Timeout,

    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Io error: {0}")]
    Io(String),

    /// 重试耗尽，对处理循环是致命错误
    #[error("Capture failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// 单帧图像
#[derive(Debug, Clone)]
pub struct FrameCapture {
    /// JPEG 数据
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl FrameCapture {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            captured_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Capture Source Port
#[async_trait]
pub trait CaptureSourcePort: Send + Sync {
    /// 采集一帧（单次尝试）
    async fn capture_frame(&self) -> Result<FrameCapture, CaptureError>;

    /// 检查摄像头是否可达
    async fn test_connection(&self) -> bool {
        true
    }
}
