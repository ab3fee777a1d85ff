//! 通知正文格式化，各渠道共用

use chrono::Utc;

use crate::application::ports::{AlertNotification, StatusChangeNotification};
use crate::domain::analysis::OverallStatus;
use crate::domain::machine::round_percent;
use crate::domain::RunningStatistics;

pub const ALERT_TITLE: &str = "Print problem detected";
pub const STATUS_CHANGE_TITLE: &str = "Printer status changed";
pub const PERIODIC_TITLE: &str = "PrintWatch status report";

/// 告警附件文件名
pub const FRAME_FILENAME: &str = "frame.jpg";

pub fn status_color(status: OverallStatus) -> u32 {
    match status {
        OverallStatus::Good => 0x2ECC71,
        OverallStatus::Warning => 0xF1C40F,
        OverallStatus::Critical => 0xE74C3C,
        OverallStatus::Error => 0x95A5A6,
    }
}

/// 每个问题一行：`- issue (92.00%): reason`
pub fn problem_lines(alert: &AlertNotification) -> String {
    alert
        .problems
        .iter()
        .map(|p| {
            format!(
                "- {} ({:.2}%): {}",
                p.issue,
                round_percent(p.confidence * 100.0),
                p.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn alert_text(alert: &AlertNotification) -> String {
    format!(
        "{} (frame #{}, status: {})\n{}",
        ALERT_TITLE,
        alert.frame_number,
        alert.overall_status,
        problem_lines(alert)
    )
}

pub fn status_change_text(change: &StatusChangeNotification) -> String {
    format!("{}\n{}", change.transition, change.summary)
}

pub fn periodic_text(stats: &RunningStatistics) -> String {
    format!("{}\n{}", PERIODIC_TITLE, stats.summary(Utc::now()))
}

/// 按字符截断，超出时以省略号结尾
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::application::ports::{AlertNotification, FrameCapture, StatusChangeNotification};
    use crate::domain::analysis::{OverallStatus, Problem};
    use crate::domain::machine::MachineStatusSnapshot;

    pub fn alert() -> AlertNotification {
        AlertNotification {
            frame_number: 42,
            problems: vec![Problem {
                issue: "spaghetti".to_string(),
                reason: "loose filament above the bed".to_string(),
                bounding_box: [0.1, 0.1, 0.5, 0.5],
                confidence: 0.925,
            }],
            overall_status: OverallStatus::Critical,
            image: FrameCapture::new(vec![0xFF, 0xD8, 0xFF, 0xD9]),
            summary: "1 problem".to_string(),
        }
    }

    pub fn status_change() -> StatusChangeNotification {
        StatusChangeNotification {
            current: MachineStatusSnapshot::with_machine_code(1),
            previous: Some(MachineStatusSnapshot::with_machine_code(0)),
            image: None,
            summary: "Machine: Printing".to_string(),
            transition: "Idle → Printing".to_string(),
        }
    }
}
