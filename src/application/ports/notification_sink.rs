//! Notification Sink Port - 通知渠道抽象
//!
//! 每个 sink 独立调用，失败只影响自身

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::analysis::{OverallStatus, Problem};
use crate::domain::machine::MachineStatusSnapshot;
use crate::domain::RunningStatistics;

use super::FrameCapture;

/// 通知错误
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 打印问题告警
#[derive(Debug, Clone)]
pub struct AlertNotification {
    pub frame_number: u64,
    /// 已按阈值过滤的问题
    pub problems: Vec<Problem>,
    pub overall_status: OverallStatus,
    pub image: FrameCapture,
    pub summary: String,
}

/// 机器状态变化通知
#[derive(Debug, Clone)]
pub struct StatusChangeNotification {
    pub current: MachineStatusSnapshot,
    /// 启动通知时为空
    pub previous: Option<MachineStatusSnapshot>,
    pub image: Option<FrameCapture>,
    /// 已格式化的状态摘要
    pub summary: String,
    pub transition: String,
}

/// Notification Sink Port
#[async_trait]
pub trait NotificationSinkPort: Send + Sync {
    /// sink 名称（用于统计和日志）
    fn name(&self) -> &str;

    /// 是否接收周期性报告
    fn accepts_periodic_updates(&self) -> bool {
        true
    }

    async fn send_alert(&self, alert: &AlertNotification) -> Result<(), NotificationError>;

    async fn send_status_change(
        &self,
        change: &StatusChangeNotification,
    ) -> Result<(), NotificationError>;

    async fn send_periodic_update(
        &self,
        stats: &RunningStatistics,
    ) -> Result<(), NotificationError>;
}
