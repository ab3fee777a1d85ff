//! Monitor - 帧处理编排
//!
//! 包含：
//! - settings: 编排器运行参数
//! - state: 周期间共享的可变状态
//! - request_handler: 队列请求执行者（采集/分析 + 重试）
//! - frame_processor: 单周期编排

mod frame_processor;
mod request_handler;
mod settings;
mod state;

pub use frame_processor::{CycleOutcome, CycleReport, FrameProcessor};
pub use request_handler::{analyze_with_retry, capture_with_retry, MonitorRequestHandler};
pub use settings::{MonitorSettings, MIN_CYCLE_SPACING};
pub use state::MonitorState;
