//! Running Statistics - 进程级运行统计
//!
//! 只由编排器在每个周期后修改，不做持久化

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::analysis::OverallStatus;
use super::machine::format_duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningStatistics {
    pub started_at: DateTime<Utc>,
    /// 完成的处理周期（每个周期一帧）
    pub frames_processed: u64,
    pub frames_analyzed: u64,
    /// 门控拒绝或分析被禁用的帧
    pub frames_skipped: u64,
    pub analysis_failures: u64,
    pub problems_detected: u64,
    pub notifications_sent: u64,
    /// sink 名称 -> 成功发送次数
    pub notifications_by_sink: BTreeMap<String, u64>,
    pub status_changes_detected: u64,
    pub last_overall_status: Option<OverallStatus>,
}

impl RunningStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            frames_processed: 0,
            frames_analyzed: 0,
            frames_skipped: 0,
            analysis_failures: 0,
            problems_detected: 0,
            notifications_sent: 0,
            notifications_by_sink: BTreeMap::new(),
            status_changes_detected: 0,
            last_overall_status: None,
        }
    }

    pub fn record_notification(&mut self, sink: &str) {
        self.notifications_sent += 1;
        *self.notifications_by_sink.entry(sink.to_string()).or_insert(0) += 1;
    }

    pub fn uptime_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// 周期性报告正文
    pub fn summary(&self, now: DateTime<Utc>) -> String {
        let mut lines = vec![
            format!("Uptime: {}", format_duration(self.uptime_secs(now))),
            format!(
                "Frames: {} processed, {} analyzed, {} skipped",
                self.frames_processed, self.frames_analyzed, self.frames_skipped
            ),
            format!("Problems detected: {}", self.problems_detected),
            format!("Notifications sent: {}", self.notifications_sent),
            format!("Status changes: {}", self.status_changes_detected),
        ];
        if self.analysis_failures > 0 {
            lines.push(format!("Analysis failures: {}", self.analysis_failures));
        }
        if let Some(status) = self.last_overall_status {
            lines.push(format!("Last print status: {}", status));
        }
        lines.join("\n")
    }
}

impl Default for RunningStatistics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_notifications_tracked_per_sink() {
        let mut stats = RunningStatistics::new();
        stats.record_notification("discord");
        stats.record_notification("discord");
        stats.record_notification("telegram");

        assert_eq!(stats.notifications_sent, 3);
        assert_eq!(stats.notifications_by_sink.get("discord"), Some(&2));
        assert_eq!(stats.notifications_by_sink.get("telegram"), Some(&1));
    }

    #[test]
    fn test_summary_contents() {
        let mut stats = RunningStatistics::new();
        stats.frames_processed = 12;
        stats.frames_analyzed = 7;
        stats.frames_skipped = 5;
        stats.last_overall_status = Some(OverallStatus::Good);

        let summary = stats.summary(stats.started_at + Duration::seconds(125));
        assert!(summary.contains("Uptime: 2m 05s"));
        assert!(summary.contains("12 processed, 7 analyzed, 5 skipped"));
        assert!(summary.contains("Last print status: good"));
        assert!(!summary.contains("Analysis failures"));
    }
}
