//! Machine Context - 打印机状态限界上下文
//!
//! 职责:
//! - 状态快照模型
//! - 状态变化检测与通知冷却
//! - 分析门控
//! - 状态文本格式化

mod change_detector;
mod format;
mod gate;
mod snapshot;

pub use change_detector::{NotificationCooldown, StatusChangeDetector};
pub use format::{format_duration, format_status_summary, format_transition, round_percent};
pub use gate::should_analyze;
pub use snapshot::{
    machine_status_text, print_status_text, LayerProgress, MachineStatusSnapshot, StatusCode,
    TimeInfo, MACHINE_CODE_PRINTING,
};
