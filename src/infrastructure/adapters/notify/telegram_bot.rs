//! Telegram Bot Sink - 通过 Bot API 推送通知
//!
//! 实现 NotificationSinkPort trait
//!
//! Telegram API:
//! POST https://api.telegram.org/bot<token>/sendPhoto    (multipart: chat_id, caption, photo)
//! POST https://api.telegram.org/bot<token>/sendMessage  (JSON: chat_id, text)

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::application::ports::{
    AlertNotification, FrameCapture, NotificationError, NotificationSinkPort,
    StatusChangeNotification,
};
use crate::domain::RunningStatistics;

use super::message::{
    alert_text, periodic_text, status_change_text, truncate_chars, FRAME_FILENAME,
    STATUS_CHANGE_TITLE,
};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// sendPhoto caption 上限
const MAX_CAPTION_CHARS: usize = 1024;
/// sendMessage text 上限
const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram Bot 配置
#[derive(Debug, Clone)]
pub struct TelegramBotConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub periodic_updates: bool,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl TelegramBotConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            periodic_updates: true,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 15,
        }
    }

    pub fn with_periodic_updates(mut self, enabled: bool) -> Self {
        self.periodic_updates = enabled;
        self
    }
}

/// Bot API 响应
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot Sink
pub struct TelegramBotSink {
    client: Client,
    config: TelegramBotConfig,
}

impl TelegramBotSink {
    pub fn new(config: TelegramBotConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.config.api_base, self.config.bot_token, method)
    }

    async fn send_message(&self, text: &str) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": truncate_chars(text, MAX_MESSAGE_CHARS),
            }))
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;
        check_response(response).await
    }

    async fn send_photo(&self, caption: &str, image: &FrameCapture) -> Result<(), NotificationError> {
        let photo = Part::bytes(image.data.clone())
            .file_name(FRAME_FILENAME)
            .mime_str("image/jpeg")
            .map_err(|e| NotificationError::SerializationError(e.to_string()))?;

        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", truncate_chars(caption, MAX_CAPTION_CHARS))
            .part("photo", photo);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;
        check_response(response).await
    }
}

async fn check_response(response: reqwest::Response) -> Result<(), NotificationError> {
    let status = response.status();
    let body: TelegramResponse = response
        .json()
        .await
        .map_err(|e| NotificationError::ServiceError(format!("HTTP {}: {}", status, e)))?;

    if body.ok {
        Ok(())
    } else {
        Err(NotificationError::ServiceError(format!(
            "HTTP {}: {}",
            status,
            body.description.unwrap_or_default()
        )))
    }
}

#[async_trait]
impl NotificationSinkPort for TelegramBotSink {
    fn name(&self) -> &str {
        "telegram"
    }

    fn accepts_periodic_updates(&self) -> bool {
        self.config.periodic_updates
    }

    async fn send_alert(&self, alert: &AlertNotification) -> Result<(), NotificationError> {
        self.send_photo(&alert_text(alert), &alert.image).await
    }

    async fn send_status_change(
        &self,
        change: &StatusChangeNotification,
    ) -> Result<(), NotificationError> {
        let text = format!("{}\n{}", STATUS_CHANGE_TITLE, status_change_text(change));
        match &change.image {
            Some(image) => self.send_photo(&text, image).await,
            None => self.send_message(&text).await,
        }
    }

    async fn send_periodic_update(
        &self,
        stats: &RunningStatistics,
    ) -> Result<(), NotificationError> {
        self.send_message(&periodic_text(stats)).await
    }
}
