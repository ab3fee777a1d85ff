//! Machine Context - Status Snapshot

use serde::{Deserialize, Serialize};

/// 机器状态码：正在打印
pub const MACHINE_CODE_PRINTING: i64 = 1;

/// 机器状态码对应的文本
pub fn machine_status_text(code: i64) -> String {
    match code {
        0 => "Idle".to_string(),
        1 => "Printing".to_string(),
        2 => "File Transferring".to_string(),
        3 => "Calibrating".to_string(),
        4 => "Device Testing".to_string(),
        other => format!("Unknown ({})", other),
    }
}

/// 打印任务状态码对应的文本
pub fn print_status_text(code: i64) -> String {
    match code {
        0 => "Idle".to_string(),
        1 => "Homing".to_string(),
        2 => "Dropping".to_string(),
        3 => "Exposing".to_string(),
        4 => "Lifting".to_string(),
        5 => "Pausing".to_string(),
        6 => "Paused".to_string(),
        7 => "Stopping".to_string(),
        8 => "Stopped".to_string(),
        9 => "Complete".to_string(),
        10 => "File Checking".to_string(),
        13 => "Printing".to_string(),
        16 => "Heating".to_string(),
        20 => "Bed Leveling".to_string(),
        other => format!("Unknown ({})", other),
    }
}

/// 带状态码的子结构
///
/// `code` 为 `None` 表示上游给出的值不是合法整数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCode {
    pub code: Option<i64>,
    pub text: String,
}

impl StatusCode {
    pub fn machine(code: i64) -> Self {
        Self {
            code: Some(code),
            text: machine_status_text(code),
        }
    }

    pub fn print(code: i64) -> Self {
        Self {
            code: Some(code),
            text: print_status_text(code),
        }
    }
}

/// 层进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProgress {
    pub current_layer: u32,
    pub total_layers: u32,
    pub percent: f64,
}

/// 时间信息（秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub percent: f64,
}

impl TimeInfo {
    pub fn from_ticks(elapsed_secs: u64, total_secs: u64) -> Self {
        let percent = if total_secs > 0 {
            (elapsed_secs as f64 / total_secs as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        Self {
            elapsed_secs,
            total_secs,
            remaining_secs: total_secs.saturating_sub(elapsed_secs),
            percent,
        }
    }
}

/// 打印机状态快照
///
/// 由状态源按需生成，跨周期成对比较，从不修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStatusSnapshot {
    pub success: bool,
    pub machine: Option<StatusCode>,
    pub print: Option<StatusCode>,
    pub filename: Option<String>,
    pub progress: Option<LayerProgress>,
    pub time_info: Option<TimeInfo>,
}

impl MachineStatusSnapshot {
    /// 状态不可用时的快照
    pub fn unavailable() -> Self {
        Self {
            success: false,
            machine: None,
            print: None,
            filename: None,
            progress: None,
            time_info: None,
        }
    }

    /// 仅包含机器状态码的快照
    pub fn with_machine_code(code: i64) -> Self {
        Self {
            success: true,
            machine: Some(StatusCode::machine(code)),
            ..Self::unavailable()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.success
    }

    pub fn machine_code(&self) -> Option<i64> {
        self.machine.as_ref().and_then(|m| m.code)
    }

    pub fn machine_text(&self) -> &str {
        self.machine
            .as_ref()
            .map(|m| m.text.as_str())
            .unwrap_or("Unknown")
    }

    pub fn print_text(&self) -> Option<&str> {
        self.print.as_ref().map(|p| p.text.as_str())
    }

    pub fn is_printing(&self) -> bool {
        self.is_valid() && self.machine_code() == Some(MACHINE_CODE_PRINTING)
    }
}
