//! Monitor Worker - 定时驱动帧处理周期
//!
//! 每个周期结束后按 `cycle_spacing` 调度下一次（从周期开始时刻计算）。
//! 周期从不重叠，关闭信号只在周期之间生效。

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::monitor::FrameProcessor;
use crate::application::ports::CaptureError;
use crate::infrastructure::events::EventPublisher;

/// 监控 Worker
pub struct MonitorWorker {
    processor: FrameProcessor,
    event_publisher: Arc<EventPublisher>,
}

impl MonitorWorker {
    pub fn new(processor: FrameProcessor, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            processor,
            event_publisher,
        }
    }

    /// 启动处理循环
    ///
    /// 只有采集重试耗尽时返回错误
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), CaptureError> {
        let spacing = self.processor.settings().cycle_spacing();
        tracing::info!(
            spacing_ms = spacing.as_millis() as u64,
            vision_enabled = self.processor.settings().vision_enabled,
            "MonitorWorker started"
        );

        loop {
            let started = Instant::now();

            match self.processor.process_cycle().await {
                Ok(report) => {
                    tracing::debug!(
                        frame = report.frame_number,
                        outcome = ?report.outcome,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Cycle completed"
                    );
                    self.event_publisher.publish_cycle(&report);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Frame capture exhausted retries, monitor halted");
                    self.event_publisher.publish_halted(&e.to_string());
                    return Err(e);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep_until(started + spacing) => {}
            }
        }

        tracing::info!(
            frames = self.processor.state().stats.frames_processed,
            "MonitorWorker stopped"
        );
        Ok(())
    }
}
