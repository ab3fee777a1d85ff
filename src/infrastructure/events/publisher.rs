//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现，所有订阅者共享一个全局广播通道

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::monitor::{CycleOutcome, CycleReport};

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum MonitorEvent {
    /// 周期完成
    CycleCompleted {
        frame_number: u64,
        outcome: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        overall_status: Option<String>,
    },
    /// 已触发打印问题告警
    AlertRaised {
        frame_number: u64,
        overall_status: String,
        problems: usize,
        delivered: usize,
    },
    /// 机器状态变化已通知
    StatusChanged { frame_number: u64, transition: String },
    /// 处理循环中止
    MonitorHalted { reason: String },
}

impl MonitorEvent {
    /// 由周期报告生成的事件序列
    pub fn from_report(report: &CycleReport) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        if let Some(transition) = &report.status_change {
            events.push(MonitorEvent::StatusChanged {
                frame_number: report.frame_number,
                transition: transition.clone(),
            });
        }

        let (outcome, overall_status) = match &report.outcome {
            CycleOutcome::StatusOnly => ("status_only", None),
            CycleOutcome::Skipped => ("skipped", None),
            CycleOutcome::AnalysisFailed { .. } => ("analysis_failed", None),
            CycleOutcome::Analyzed {
                overall_status,
                alerted_problems,
                alerts_delivered,
                ..
            } => {
                if *alerted_problems > 0 {
                    events.push(MonitorEvent::AlertRaised {
                        frame_number: report.frame_number,
                        overall_status: overall_status.as_str().to_string(),
                        problems: *alerted_problems,
                        delivered: *alerts_delivered,
                    });
                }
                ("analyzed", Some(overall_status.as_str().to_string()))
            }
        };

        events.push(MonitorEvent::CycleCompleted {
            frame_number: report.frame_number,
            outcome: outcome.to_string(),
            overall_status,
        });
        events
    }
}

/// 事件发布器
pub struct EventPublisher {
    global_channel: broadcast::Sender<MonitorEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.global_channel.subscribe()
    }

    /// 发布周期报告对应的事件
    pub fn publish_cycle(&self, report: &CycleReport) {
        for event in MonitorEvent::from_report(report) {
            self.publish(event);
        }
    }

    /// 发布循环中止事件
    pub fn publish_halted(&self, reason: &str) {
        self.publish(MonitorEvent::MonitorHalted {
            reason: reason.to_string(),
        });
    }

    fn publish(&self, event: MonitorEvent) {
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::OverallStatus;

    #[test]
    fn test_alert_cycle_events() {
        let report = CycleReport {
            frame_number: 7,
            outcome: CycleOutcome::Analyzed {
                overall_status: OverallStatus::Critical,
                problems: 2,
                alerted_problems: 1,
                alerts_delivered: 2,
            },
            status_change: Some("Idle → Printing".to_string()),
            periodic_update_sent: false,
        };

        let events = MonitorEvent::from_report(&report);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], MonitorEvent::StatusChanged { transition, .. } if transition == "Idle → Printing"));
        assert!(matches!(&events[1], MonitorEvent::AlertRaised { problems: 1, delivered: 2, .. }));
        assert!(matches!(&events[2], MonitorEvent::CycleCompleted { outcome, .. } if outcome == "analyzed"));
    }

    #[test]
    fn test_event_wire_format() {
        let event = MonitorEvent::CycleCompleted {
            frame_number: 3,
            outcome: "skipped".to_string(),
            overall_status: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "CycleCompleted", "data": {"frame_number": 3, "outcome": "skipped"}})
        );
    }

    #[tokio::test]
    async fn test_subscribers_receive_halt() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish_halted("camera unreachable");

        assert_eq!(
            rx.recv().await.unwrap(),
            MonitorEvent::MonitorHalted {
                reason: "camera unreachable".to_string()
            }
        );
    }
}
