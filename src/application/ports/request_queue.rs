//! Request Queue Port - 单飞请求仲裁
//!
//! 所有采集/分析请求通过同一个 FIFO 队列串行执行

use async_trait::async_trait;
use thiserror::Error;

use crate::application::error::ApplicationError;
use crate::domain::analysis::AnalysisResult;
use crate::domain::machine::MachineStatusSnapshot;

use super::FrameCapture;

/// 队列错误
#[derive(Debug, Error)]
pub enum QueueError {
    /// 处理器执行失败，只影响当前请求
    #[error("Request {id} failed: {source}")]
    HandlerFailed {
        id: u64,
        #[source]
        source: ApplicationError,
    },

    /// 消费循环在交付结果前退出
    #[error("Request {0} was dropped before completion")]
    Dropped(u64),
}

/// 请求类型
#[derive(Debug, Clone)]
pub enum RequestKind {
    /// 采集 + 分析
    Status,
    /// 采集 + 分析 + 设备状态
    Analyze,
    /// 仅采集
    Frame,
    /// 分析调用方已采集的帧
    Inspect(FrameCapture),
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Status => "status",
            RequestKind::Analyze => "analyze",
            RequestKind::Frame => "frame",
            RequestKind::Inspect(_) => "inspect",
        }
    }
}

/// 分析报告
#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub frame: FrameCapture,
    pub analysis: AnalysisResult,
    /// 仅 `Analyze` 请求携带
    pub machine_status: Option<MachineStatusSnapshot>,
}

/// 请求结果
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Report(InspectionReport),
    Frame(FrameCapture),
}

/// 请求处理器：按类型执行实际的采集/分析
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, kind: RequestKind) -> Result<RequestOutcome, ApplicationError>;
}

/// Request Queue Port
#[async_trait]
pub trait RequestQueuePort: Send + Sync {
    /// 入队并等待结果
    async fn enqueue(&self, kind: RequestKind) -> Result<RequestOutcome, QueueError>;

    /// 等待中的请求数（不含正在执行的请求）
    fn pending(&self) -> usize;
}
