//! Discord Webhook Sink - 通过 Webhook 推送通知
//!
//! 实现 NotificationSinkPort trait
//!
//! Discord API:
//! POST {webhook_url}
//! 带图片: multipart (payload_json + files[0])
//! 纯文本: JSON {"embeds": [...]}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::application::ports::{
    AlertNotification, FrameCapture, NotificationError, NotificationSinkPort,
    StatusChangeNotification,
};
use crate::domain::RunningStatistics;

use super::message::{
    periodic_text, problem_lines, status_color, truncate_chars, ALERT_TITLE, FRAME_FILENAME,
    PERIODIC_TITLE, STATUS_CHANGE_TITLE,
};

/// embed description 上限
const MAX_DESCRIPTION_CHARS: usize = 4096;
const STATUS_CHANGE_COLOR: u32 = 0x3498DB;

/// Discord Webhook 配置
#[derive(Debug, Clone)]
pub struct DiscordWebhookConfig {
    pub webhook_url: String,
    pub periodic_updates: bool,
    pub timeout_secs: u64,
}

impl DiscordWebhookConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            periodic_updates: true,
            timeout_secs: 15,
        }
    }

    pub fn with_periodic_updates(mut self, enabled: bool) -> Self {
        self.periodic_updates = enabled;
        self
    }
}

/// Discord Webhook Sink
pub struct DiscordWebhookSink {
    client: Client,
    config: DiscordWebhookConfig,
}

impl DiscordWebhookSink {
    pub fn new(config: DiscordWebhookConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn post_json(&self, payload: Value) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;
        check_status(response).await
    }

    async fn post_with_image(
        &self,
        payload: Value,
        image: &FrameCapture,
    ) -> Result<(), NotificationError> {
        let payload_json = serde_json::to_string(&payload)
            .map_err(|e| NotificationError::SerializationError(e.to_string()))?;
        let file = Part::bytes(image.data.clone())
            .file_name(FRAME_FILENAME)
            .mime_str("image/jpeg")
            .map_err(|e| NotificationError::SerializationError(e.to_string()))?;

        let form = Form::new()
            .text("payload_json", payload_json)
            .part("files[0]", file);

        let response = self
            .client
            .post(&self.config.webhook_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), NotificationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(NotificationError::ServiceError(format!(
        "HTTP {}: {}",
        status, error_text
    )))
}

fn embed(title: &str, description: &str, color: u32, with_image: bool) -> Value {
    let mut embed = json!({
        "title": title,
        "description": truncate_chars(description, MAX_DESCRIPTION_CHARS),
        "color": color,
    });
    if with_image {
        embed["image"] = json!({ "url": format!("attachment://{}", FRAME_FILENAME) });
    }
    embed
}

pub fn alert_payload(alert: &AlertNotification) -> Value {
    let mut description = problem_lines(alert);
    description.push_str(&format!("\n\n{}", alert.summary));

    let mut embed = embed(ALERT_TITLE, &description, status_color(alert.overall_status), true);
    embed["fields"] = json!([
        { "name": "Frame", "value": alert.frame_number.to_string(), "inline": true },
        { "name": "Status", "value": alert.overall_status.as_str(), "inline": true },
    ]);
    json!({ "embeds": [embed] })
}

pub fn status_change_payload(change: &StatusChangeNotification) -> Value {
    json!({
        "embeds": [embed(
            STATUS_CHANGE_TITLE,
            &format!("**{}**\n{}", change.transition, change.summary),
            STATUS_CHANGE_COLOR,
            change.image.is_some(),
        )]
    })
}

#[async_trait]
impl NotificationSinkPort for DiscordWebhookSink {
    fn name(&self) -> &str {
        "discord"
    }

    fn accepts_periodic_updates(&self) -> bool {
        self.config.periodic_updates
    }

    async fn send_alert(&self, alert: &AlertNotification) -> Result<(), NotificationError> {
        self.post_with_image(alert_payload(alert), &alert.image).await
    }

    async fn send_status_change(
        &self,
        change: &StatusChangeNotification,
    ) -> Result<(), NotificationError> {
        let payload = status_change_payload(change);
        match &change.image {
            Some(image) => self.post_with_image(payload, image).await,
            None => self.post_json(payload).await,
        }
    }

    async fn send_periodic_update(
        &self,
        stats: &RunningStatistics,
    ) -> Result<(), NotificationError> {
        let payload = json!({
            "embeds": [embed(PERIODIC_TITLE, &periodic_text(stats), STATUS_CHANGE_COLOR, false)]
        });
        self.post_json(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::notify::message::fixtures;

    #[test]
    fn test_alert_payload_references_attachment() {
        let payload = alert_payload(&fixtures::alert());
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], ALERT_TITLE);
        assert_eq!(embed["color"], 0xE74C3C);
        assert_eq!(embed["image"]["url"], "attachment://frame.jpg");
        assert_eq!(embed["fields"][0]["value"], "42");
        assert_eq!(embed["fields"][1]["value"], "critical");
        assert!(embed["description"]
            .as_str()
            .unwrap()
            .contains("spaghetti (92.50%)"));
    }

    #[test]
    fn test_status_change_without_image_has_no_attachment() {
        let payload = status_change_payload(&fixtures::status_change());
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], STATUS_CHANGE_TITLE);
        assert!(embed.get("image").is_none());
        assert_eq!(embed["description"], "**Idle → Printing**\nMachine: Printing");
    }

    #[test]
    fn test_periodic_updates_flag() {
        let sink = DiscordWebhookSink::new(
            DiscordWebhookConfig::new("https://discord.com/api/webhooks/1/abc")
                .with_periodic_updates(false),
        )
        .unwrap();
        assert_eq!(sink.name(), "discord");
        assert!(!sink.accepts_periodic_updates());
    }
}
