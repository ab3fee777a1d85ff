//! Memory Layer - In-Memory State Management
//!
//! 实现 RequestQueue，串行化所有采集/分析请求

mod request_queue;

pub use request_queue::{InMemoryRequestQueue, DEFAULT_QUEUE_PAUSE};
