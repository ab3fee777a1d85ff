//! Events - 监控事件广播

mod publisher;

pub use publisher::{EventPublisher, MonitorEvent};
