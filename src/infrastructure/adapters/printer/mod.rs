//! Printer Adapter - 打印机状态源实现

mod sdcp_status_client;

pub use sdcp_status_client::{snapshot_from_status_message, SdcpStatusClient, SdcpStatusClientConfig};
