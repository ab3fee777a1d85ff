//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Analysis Context: 视觉分析结果
//! - Machine Context: 打印机状态

pub mod analysis;
pub mod machine;

// 运行统计
mod statistics;

pub use statistics::RunningStatistics;
