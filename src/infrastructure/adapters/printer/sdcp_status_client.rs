//! SDCP Status Client - 通过 WebSocket 查询打印机状态
//!
//! 实现 MachineStatusPort trait
//!
//! 打印机 API:
//! WS ws://<printer>:3030/websocket
//! Request:  {"Id": "", "Data": {"Cmd": 0, ...}, "Topic": "sdcp/request/<MainboardID>"}
//! Response: {"Status": {"CurrentStatus": [1], "PrintInfo": {...}}, "Topic": "sdcp/status/<MainboardID>"}
//!
//! 每次查询建立一次短连接，整个往返受超时约束

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::application::ports::{MachineStatusPort, StatusError};
use crate::domain::machine::{
    machine_status_text, print_status_text, LayerProgress, MachineStatusSnapshot, StatusCode,
    TimeInfo,
};

const CMD_GET_STATUS: i64 = 0;
const STATUS_TOPIC_PREFIX: &str = "sdcp/status/";

/// SDCP 状态客户端配置
#[derive(Debug, Clone)]
pub struct SdcpStatusClientConfig {
    pub host: String,
    pub port: u16,
    /// 主板 ID，未知时留空
    pub mainboard_id: String,
    /// 单次查询往返超时（秒）
    pub timeout_secs: u64,
}

impl Default for SdcpStatusClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            mainboard_id: String::new(),
            timeout_secs: 5,
        }
    }
}

impl SdcpStatusClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_mainboard_id(mut self, id: impl Into<String>) -> Self {
        self.mainboard_id = id.into();
        self
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/websocket", self.host, self.port)
    }
}

/// SDCP 状态客户端
pub struct SdcpStatusClient {
    config: SdcpStatusClientConfig,
}

impl SdcpStatusClient {
    pub fn new(config: SdcpStatusClientConfig) -> Self {
        Self { config }
    }

    fn status_request(&self) -> Value {
        json!({
            "Id": "",
            "Data": {
                "Cmd": CMD_GET_STATUS,
                "Data": {},
                "RequestID": uuid::Uuid::new_v4().simple().to_string(),
                "MainboardID": self.config.mainboard_id,
                "TimeStamp": chrono::Utc::now().timestamp_millis(),
                "From": 1
            },
            "Topic": format!("sdcp/request/{}", self.config.mainboard_id)
        })
    }

    async fn round_trip(&self) -> Result<MachineStatusSnapshot, StatusError> {
        let url = self.config.ws_url();
        let (mut socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| StatusError::ConnectionError(format!("{}: {}", url, e)))?;

        socket
            .send(Message::Text(self.status_request().to_string()))
            .await
            .map_err(|e| StatusError::ConnectionError(e.to_string()))?;

        while let Some(message) = socket.next().await {
            let message = message.map_err(|e| StatusError::ConnectionError(e.to_string()))?;
            let Message::Text(text) = message else {
                continue;
            };

            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring non-JSON printer message");
                    continue;
                }
            };

            if !is_status_message(&value) {
                continue;
            }

            let snapshot = snapshot_from_status_message(&value)?;
            let _ = socket.close(None).await;
            return Ok(snapshot);
        }

        Err(StatusError::ConnectionError(
            "connection closed before status arrived".to_string(),
        ))
    }
}

fn is_status_message(value: &Value) -> bool {
    value
        .get("Topic")
        .and_then(Value::as_str)
        .map(|topic| topic.starts_with(STATUS_TOPIC_PREFIX))
        .unwrap_or(false)
        || value.get("Status").map(Value::is_object).unwrap_or(false)
}

/// 状态消息映射为快照
///
/// 非整数的状态码映射为 `code: None`，变化检测会忽略这类快照
pub fn snapshot_from_status_message(value: &Value) -> Result<MachineStatusSnapshot, StatusError> {
    let status = value
        .get("Status")
        .filter(|s| s.is_object())
        .ok_or_else(|| StatusError::ProtocolError("missing Status object".to_string()))?;

    let machine = status.get("CurrentStatus").map(|raw| {
        // 固件返回数组，旧版本返回单个整数
        let code = match raw {
            Value::Array(items) => items.first().and_then(Value::as_i64),
            other => other.as_i64(),
        };
        StatusCode {
            code,
            text: code.map(machine_status_text).unwrap_or_else(|| "Unknown".to_string()),
        }
    });

    let print_info = status.get("PrintInfo").filter(|p| p.is_object());

    let print = print_info.and_then(|info| info.get("Status")).map(|raw| {
        let code = raw.as_i64();
        StatusCode {
            code,
            text: code.map(print_status_text).unwrap_or_else(|| "Unknown".to_string()),
        }
    });

    let filename = print_info
        .and_then(|info| info.get("Filename"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let progress = print_info.and_then(|info| {
        // 超出 u32 的层数视为异常数据
        let current = u32::try_from(info.get("CurrentLayer")?.as_u64()?).ok()?;
        let total = u32::try_from(info.get("TotalLayer")?.as_u64()?).ok()?;
        if total == 0 {
            return None;
        }
        Some(LayerProgress {
            current_layer: current,
            total_layers: total,
            percent: (f64::from(current) / f64::from(total) * 100.0).min(100.0),
        })
    });

    let time_info = print_info.and_then(|info| {
        let current = info.get("CurrentTicks")?.as_u64()?;
        let total = info.get("TotalTicks")?.as_u64()?;
        (total > 0).then(|| TimeInfo::from_ticks(current, total))
    });

    Ok(MachineStatusSnapshot {
        success: true,
        machine,
        print,
        filename,
        progress,
        time_info,
    })
}

#[async_trait]
impl MachineStatusPort for SdcpStatusClient {
    async fn get_status(&self) -> Result<MachineStatusSnapshot, StatusError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let snapshot = tokio::time::timeout(timeout, self.round_trip())
            .await
            .map_err(|_| StatusError::Timeout)??;

        tracing::debug!(
            machine = snapshot.machine_text(),
            print = snapshot.print_text().unwrap_or("-"),
            "Printer status received"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url() {
        let config = SdcpStatusClientConfig::new("192.168.1.50").with_mainboard_id("abc123");
        assert_eq!(config.ws_url(), "ws://192.168.1.50:3030/websocket");
        assert_eq!(config.mainboard_id, "abc123");
    }

    #[test]
    fn test_status_request_shape() {
        let client = SdcpStatusClient::new(
            SdcpStatusClientConfig::new("printer.local").with_mainboard_id("abc123"),
        );
        let request = client.status_request();

        assert_eq!(request["Topic"], "sdcp/request/abc123");
        assert_eq!(request["Data"]["Cmd"], 0);
        assert_eq!(request["Data"]["MainboardID"], "abc123");
        assert_eq!(request["Data"]["RequestID"].as_str().map(str::len), Some(32));
    }

    #[test]
    fn test_printing_status_mapping() {
        let message = json!({
            "Topic": "sdcp/status/abc123",
            "Status": {
                "CurrentStatus": [1],
                "PrintInfo": {
                    "Status": 13,
                    "CurrentLayer": 25,
                    "TotalLayer": 100,
                    "CurrentTicks": 600,
                    "TotalTicks": 2400,
                    "Filename": "benchy.gcode"
                }
            }
        });
        assert!(is_status_message(&message));

        let snapshot = snapshot_from_status_message(&message).unwrap();
        assert!(snapshot.is_printing());
        assert_eq!(snapshot.machine_text(), "Printing");
        assert_eq!(snapshot.print_text(), Some("Printing"));
        assert_eq!(snapshot.filename.as_deref(), Some("benchy.gcode"));

        let progress = snapshot.progress.unwrap();
        assert_eq!((progress.current_layer, progress.total_layers), (25, 100));
        assert_eq!(progress.percent, 25.0);

        let time = snapshot.time_info.unwrap();
        assert_eq!(time.remaining_secs, 1800);
        assert_eq!(time.percent, 25.0);
    }

    #[test]
    fn test_idle_status_without_print_info() {
        let message = json!({"Status": {"CurrentStatus": [0]}});
        let snapshot = snapshot_from_status_message(&message).unwrap();

        assert_eq!(snapshot.machine_code(), Some(0));
        assert!(snapshot.print.is_none());
        assert!(snapshot.progress.is_none());
        assert!(snapshot.time_info.is_none());
    }

    #[test]
    fn test_non_integer_code_maps_to_none() {
        let message = json!({"Status": {"CurrentStatus": ["busy"]}});
        let snapshot = snapshot_from_status_message(&message).unwrap();

        assert!(snapshot.success);
        assert_eq!(snapshot.machine_code(), None);
        assert_eq!(snapshot.machine_text(), "Unknown");
    }

    #[test]
    fn test_zero_totals_omit_progress() {
        let message = json!({
            "Status": {
                "CurrentStatus": 1,
                "PrintInfo": {"CurrentLayer": 0, "TotalLayer": 0, "CurrentTicks": 0, "TotalTicks": 0, "Filename": ""}
            }
        });
        let snapshot = snapshot_from_status_message(&message).unwrap();

        assert_eq!(snapshot.machine_code(), Some(1));
        assert!(snapshot.progress.is_none());
        assert!(snapshot.time_info.is_none());
        assert!(snapshot.filename.is_none());
    }

    #[test]
    fn test_out_of_range_layers_omit_progress() {
        let message = json!({
            "Status": {
                "CurrentStatus": 1,
                "PrintInfo": {"Status": 13, "CurrentLayer": 10, "TotalLayer": 4_294_967_396_u64}
            }
        });
        let snapshot = snapshot_from_status_message(&message).unwrap();
        assert!(snapshot.progress.is_none());

        let message = json!({
            "Status": {
                "CurrentStatus": 1,
                "PrintInfo": {"Status": 13, "CurrentLayer": -1, "TotalLayer": 100}
            }
        });
        let snapshot = snapshot_from_status_message(&message).unwrap();
        assert!(snapshot.progress.is_none());
        assert_eq!(snapshot.print_text(), Some("Printing"));
    }

    #[test]
    fn test_missing_status_is_protocol_error() {
        let message = json!({"Topic": "sdcp/attributes/abc123", "Attributes": {}});
        assert!(!is_status_message(&message));
        assert!(matches!(
            snapshot_from_status_message(&message),
            Err(StatusError::ProtocolError(_))
        ));
    }
}
