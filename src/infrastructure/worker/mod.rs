//! Worker Layer - Background Task Processing
//!
//! 实现 MonitorWorker，按固定间隔驱动帧处理周期

mod monitor_worker;

pub use monitor_worker::MonitorWorker;
