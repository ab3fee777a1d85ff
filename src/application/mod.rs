//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（CaptureSource、VisionClient、MachineStatus、NotificationSink、RequestQueue）
//! - monitor: 帧处理编排与请求执行
//! - retry: 有界重试
//! - prompts: 视觉模型提示词
//! - error: 应用层错误定义

pub mod error;
pub mod monitor;
pub mod ports;
pub mod prompts;
pub mod retry;

pub use error::ApplicationError;

pub use monitor::{
    CycleOutcome, CycleReport, FrameProcessor, MonitorRequestHandler, MonitorSettings,
    MonitorState,
};

pub use ports::{
    AlertNotification, AnalysisError, CaptureError, CaptureSourcePort, FrameCapture,
    InspectionReport, MachineStatusPort, NotificationError, NotificationSinkPort, QueueError,
    RequestHandler, RequestKind, RequestOutcome, RequestQueuePort, StatusChangeNotification,
    StatusError, VisionClientPort,
};

pub use retry::{RetryExhausted, RetryPolicy};
