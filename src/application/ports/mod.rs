//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod capture_source;
mod machine_status;
mod notification_sink;
mod request_queue;
mod vision_client;

pub use capture_source::{CaptureError, CaptureSourcePort, FrameCapture};
pub use machine_status::{MachineStatusPort, StatusError};
pub use notification_sink::{
    AlertNotification, NotificationError, NotificationSinkPort, StatusChangeNotification,
};
pub use request_queue::{
    InspectionReport, QueueError, RequestHandler, RequestKind, RequestOutcome, RequestQueuePort,
};
pub use vision_client::{AnalysisError, VisionClientPort};
