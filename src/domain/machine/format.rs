//! Machine Context - 状态文本格式化
//!
//! 所有百分比统一保留两位小数

use super::snapshot::MachineStatusSnapshot;

/// 百分比保留两位小数
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 秒数格式化为 `1h 02m 03s`
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// 多行状态摘要，用于通知正文
pub fn format_status_summary(snapshot: &MachineStatusSnapshot) -> String {
    if !snapshot.is_valid() {
        return "Printer status unavailable".to_string();
    }

    let mut lines = vec![format!("Machine: {}", snapshot.machine_text())];

    if let Some(print) = snapshot.print_text() {
        lines.push(format!("Print: {}", print));
    }
    if let Some(filename) = &snapshot.filename {
        lines.push(format!("File: {}", filename));
    }
    if let Some(progress) = &snapshot.progress {
        lines.push(format!(
            "Layer: {}/{} ({:.2}%)",
            progress.current_layer,
            progress.total_layers,
            round_percent(progress.percent)
        ));
    }
    if let Some(time) = &snapshot.time_info {
        lines.push(format!(
            "Time: {} elapsed, {} remaining ({:.2}%)",
            format_duration(time.elapsed_secs),
            format_duration(time.remaining_secs),
            round_percent(time.percent)
        ));
    }

    lines.join("\n")
}

/// 状态变化的一行描述
pub fn format_transition(
    previous: Option<&MachineStatusSnapshot>,
    current: &MachineStatusSnapshot,
) -> String {
    match previous {
        Some(prev) => format!("{} → {}", prev.machine_text(), current.machine_text()),
        None => format!("Monitoring started: {}", current.machine_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::machine::snapshot::{LayerProgress, StatusCode, TimeInfo};

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(33.33333), 33.33);
        assert_eq!(round_percent(66.666), 66.67);
        assert_eq!(round_percent(100.0), 100.0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(65), "1m 05s");
        assert_eq!(format_duration(3723), "1h 02m 03s");
    }

    #[test]
    fn test_summary_rounds_percentages() {
        let snapshot = MachineStatusSnapshot {
            success: true,
            machine: Some(StatusCode::machine(1)),
            print: Some(StatusCode::print(13)),
            filename: Some("benchy.gcode".to_string()),
            progress: Some(LayerProgress {
                current_layer: 10,
                total_layers: 30,
                percent: 33.333333,
            }),
            time_info: Some(TimeInfo::from_ticks(600, 1800)),
        };

        let summary = format_status_summary(&snapshot);
        assert!(summary.contains("Machine: Printing"));
        assert!(summary.contains("File: benchy.gcode"));
        assert!(summary.contains("Layer: 10/30 (33.33%)"));
        assert!(summary.contains("(33.33%)"));
        assert!(summary.contains("20m 00s remaining"));
    }

    #[test]
    fn test_unavailable_summary() {
        assert_eq!(
            format_status_summary(&MachineStatusSnapshot::unavailable()),
            "Printer status unavailable"
        );
    }

    #[test]
    fn test_transition_text() {
        let idle = MachineStatusSnapshot::with_machine_code(0);
        let printing = MachineStatusSnapshot::with_machine_code(1);
        assert_eq!(format_transition(Some(&idle), &printing), "Idle → Printing");
        assert_eq!(format_transition(None, &idle), "Monitoring started: Idle");
    }
}
