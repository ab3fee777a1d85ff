//! Machine Status Port - 打印机状态源抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::machine::MachineStatusSnapshot;

/// 状态获取错误（非致命，视为本周期无状态）
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Status request timeout")]
    Timeout,

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

/// Machine Status Port
#[async_trait]
pub trait MachineStatusPort: Send + Sync {
    async fn get_status(&self) -> Result<MachineStatusSnapshot, StatusError>;
}
