//! Application State
//!
//! 命令 API 共享的应用状态

use std::sync::Arc;

use tokio::sync::watch;

use crate::application::ports::{MachineStatusPort, RequestQueuePort};
use crate::domain::RunningStatistics;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    /// 所有采集/分析请求都经过该队列
    pub queue: Arc<dyn RequestQueuePort>,
    pub status_source: Arc<dyn MachineStatusPort>,
    /// 编排器发布的统计快照
    pub stats: watch::Receiver<RunningStatistics>,
    pub event_publisher: Arc<EventPublisher>,
    pub vision_enabled: bool,
    pub notification_threshold: f64,
}

impl AppState {
    pub fn new(
        queue: Arc<dyn RequestQueuePort>,
        status_source: Arc<dyn MachineStatusPort>,
        stats: watch::Receiver<RunningStatistics>,
        event_publisher: Arc<EventPublisher>,
        vision_enabled: bool,
        notification_threshold: f64,
    ) -> Self {
        Self {
            queue,
            status_source,
            stats,
            event_publisher,
            vision_enabled,
            notification_threshold,
        }
    }
}
