//! Frame Processor - 单周期帧处理编排
//!
//! 周期状态流转:
//! Idle → Capturing → Gating → [Analyzing] → Filtering → Notifying → Idle
//!
//! 只有采集重试耗尽会中止处理循环，其余失败都在本周期内被吸收

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::application::ports::{
    AlertNotification, CaptureError, CaptureSourcePort, FrameCapture, MachineStatusPort,
    NotificationSinkPort, RequestKind, RequestOutcome, RequestQueuePort,
    StatusChangeNotification,
};
use crate::domain::analysis::OverallStatus;
use crate::domain::machine::{
    format_status_summary, format_transition, should_analyze, MachineStatusSnapshot,
};
use crate::domain::RunningStatistics;

use super::request_handler::capture_with_retry;
use super::settings::MonitorSettings;
use super::state::MonitorState;

/// 单个周期的结果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// 视觉分析被全局关闭，只做了状态检测
    StatusOnly,
    /// 门控拒绝（打印机未在打印或状态不可用）
    Skipped,
    /// 视觉分析失败，本周期跳过
    AnalysisFailed { error: String },
    /// 完成分析
    Analyzed {
        overall_status: OverallStatus,
        problems: usize,
        /// 达到阈值并触发告警的问题数
        alerted_problems: usize,
        /// 成功送达的告警数（按 sink 计）
        alerts_delivered: usize,
    },
}

/// 周期报告
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub frame_number: u64,
    pub outcome: CycleOutcome,
    /// 已送达的状态变化描述
    pub status_change: Option<String>,
    pub periodic_update_sent: bool,
}

/// 帧处理编排器
pub struct FrameProcessor {
    settings: MonitorSettings,
    capture: Arc<dyn CaptureSourcePort>,
    status_source: Arc<dyn MachineStatusPort>,
    queue: Arc<dyn RequestQueuePort>,
    sinks: Vec<Arc<dyn NotificationSinkPort>>,
    state: MonitorState,
    stats_tx: watch::Sender<RunningStatistics>,
}

impl FrameProcessor {
    pub fn new(
        settings: MonitorSettings,
        capture: Arc<dyn CaptureSourcePort>,
        status_source: Arc<dyn MachineStatusPort>,
        queue: Arc<dyn RequestQueuePort>,
        sinks: Vec<Arc<dyn NotificationSinkPort>>,
    ) -> Self {
        let state = MonitorState::new(&settings);
        let (stats_tx, _) = watch::channel(state.stats.clone());
        Self {
            settings,
            capture,
            status_source,
            queue,
            sinks,
            state,
            stats_tx,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// 订阅统计快照（只读）
    pub fn subscribe_statistics(&self) -> watch::Receiver<RunningStatistics> {
        self.stats_tx.subscribe()
    }

    /// 执行一个完整周期
    ///
    /// 只在采集重试耗尽时返回错误
    pub async fn process_cycle(&mut self) -> Result<CycleReport, CaptureError> {
        self.state.cycle_count += 1;
        let frame_number = self.state.cycle_count;

        // Capturing
        let frame = capture_with_retry(self.capture.as_ref(), &self.settings.capture_retry).await?;
        tracing::debug!(frame = frame_number, bytes = frame.len(), "Frame captured");

        // Gating
        let status = match self.status_source.get_status().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(frame = frame_number, error = %e, "Machine status unavailable");
                None
            }
        };

        let status_change = self.handle_status_change(status.as_ref(), &frame).await;

        let outcome = if !self.settings.vision_enabled {
            self.state.stats.frames_skipped += 1;
            CycleOutcome::StatusOnly
        } else if !should_analyze(status.as_ref()) {
            tracing::debug!(
                frame = frame_number,
                machine = status.as_ref().map(|s| s.machine_text()).unwrap_or("unavailable"),
                "Printer not printing, skipping analysis"
            );
            self.state.stats.frames_skipped += 1;
            CycleOutcome::Skipped
        } else {
            self.analyze_and_notify(frame_number, frame).await
        };

        self.state.remember_status(status);
        self.state.stats.frames_processed += 1;

        let periodic_update_sent = self.maybe_send_periodic_update().await;
        self.stats_tx.send_replace(self.state.stats.clone());

        Ok(CycleReport {
            frame_number,
            outcome,
            status_change,
            periodic_update_sent,
        })
    }

    /// 检测状态变化并在冷却允许时通知
    async fn handle_status_change(
        &mut self,
        current: Option<&MachineStatusSnapshot>,
        frame: &FrameCapture,
    ) -> Option<String> {
        if !self
            .state
            .detector
            .has_status_changed(current, self.state.last_status.as_ref())
        {
            return None;
        }
        let current = current?;

        self.state.stats.status_changes_detected += 1;
        let transition = format_transition(self.state.last_status.as_ref(), current);

        if !self.state.cooldown.is_ready(Instant::now()) {
            tracing::info!(
                transition = %transition,
                remaining_ms = self.state.cooldown.remaining(Instant::now()).as_millis() as u64,
                "Status change suppressed by cooldown"
            );
            return None;
        }

        let notification = StatusChangeNotification {
            current: current.clone(),
            previous: self.state.last_status.clone(),
            image: Some(frame.clone()),
            summary: format_status_summary(current),
            transition: transition.clone(),
        };

        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.send_status_change(&notification).await {
                Ok(()) => {
                    delivered += 1;
                    self.state.stats.record_notification(sink.name());
                }
                Err(e) => {
                    tracing::warn!(sink = sink.name(), error = %e, "Status change notification failed");
                }
            }
        }

        if delivered == 0 {
            tracing::warn!(transition = %transition, "Status change was not delivered to any sink");
            return None;
        }

        self.state.cooldown.mark_sent(Instant::now());
        tracing::info!(transition = %transition, delivered, "Status change notified");
        Some(transition)
    }

    /// Analyzing → Filtering → Notifying
    async fn analyze_and_notify(&mut self, frame_number: u64, frame: FrameCapture) -> CycleOutcome {
        let report = match self.queue.enqueue(RequestKind::Inspect(frame)).await {
            Ok(RequestOutcome::Report(report)) => report,
            Ok(RequestOutcome::Frame(_)) => {
                self.state.stats.analysis_failures += 1;
                return CycleOutcome::AnalysisFailed {
                    error: "unexpected frame outcome for inspect request".to_string(),
                };
            }
            Err(e) => {
                tracing::warn!(frame = frame_number, error = %e, "Vision analysis failed, skipping cycle");
                self.state.stats.analysis_failures += 1;
                return CycleOutcome::AnalysisFailed {
                    error: e.to_string(),
                };
            }
        };

        let analysis = &report.analysis;
        self.state.stats.frames_analyzed += 1;
        self.state.stats.problems_detected += analysis.problems.len() as u64;
        self.state.stats.last_overall_status = Some(analysis.overall_status);

        let qualifying = analysis.problems_at_or_above(self.settings.notification_threshold);
        if qualifying.is_empty() {
            return CycleOutcome::Analyzed {
                overall_status: analysis.overall_status,
                problems: analysis.problems.len(),
                alerted_problems: 0,
                alerts_delivered: 0,
            };
        }

        let alert = AlertNotification {
            frame_number,
            problems: qualifying,
            overall_status: analysis.overall_status,
            image: report.frame.clone(),
            summary: analysis.summary(),
        };

        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.send_alert(&alert).await {
                Ok(()) => {
                    delivered += 1;
                    self.state.stats.record_notification(sink.name());
                }
                Err(e) => {
                    tracing::warn!(sink = sink.name(), frame = frame_number, error = %e, "Alert delivery failed");
                }
            }
        }

        tracing::info!(
            frame = frame_number,
            overall_status = %analysis.overall_status,
            problems = alert.problems.len(),
            delivered,
            "Print problem alert dispatched"
        );

        CycleOutcome::Analyzed {
            overall_status: analysis.overall_status,
            problems: analysis.problems.len(),
            alerted_problems: alert.problems.len(),
            alerts_delivered: delivered,
        }
    }

    async fn maybe_send_periodic_update(&mut self) -> bool {
        let every = self.settings.periodic_update_every;
        if every == 0 || self.state.stats.frames_processed % every != 0 {
            return false;
        }

        let mut sent = false;
        for sink in self.sinks.iter().filter(|s| s.accepts_periodic_updates()) {
            match sink.send_periodic_update(&self.state.stats).await {
                Ok(()) => sent = true,
                Err(e) => {
                    tracing::warn!(sink = sink.name(), error = %e, "Periodic update failed");
                }
            }
        }

        tracing::info!(
            frames = self.state.stats.frames_processed,
            uptime_secs = self.state.stats.uptime_secs(Utc::now()),
            sent,
            "Periodic status report"
        );
        sent
    }
}
