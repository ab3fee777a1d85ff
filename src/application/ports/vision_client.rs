//! Vision Client Port - 视觉模型抽象
//!
//! 返回模型原始文本，解析由领域层的 normalizer 负责

use async_trait::async_trait;
use thiserror::Error;

/// 视觉分析错误
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Analysis failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Vision Client Port
#[async_trait]
pub trait VisionClientPort: Send + Sync {
    /// 发送图像与提示词，返回模型原始文本（单次尝试）
    async fn analyze(
        &self,
        image: &[u8],
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AnalysisError>;

    /// 当前使用的模型名称
    fn model(&self) -> &str;
}
