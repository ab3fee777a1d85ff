//! HTTP Vision Client - 调用 OpenAI 兼容的多模态接口
//!
//! 实现 VisionClientPort trait，单次调用，不做重试
//!
//! 外部 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [system, user(text + image_url)]}  (JSON)
//! Response: {"choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{AnalysisError, VisionClientPort};

/// 视觉客户端配置
#[derive(Debug, Clone)]
pub struct HttpVisionClientConfig {
    /// API 基础 URL（不含 /chat/completions）
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpVisionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "llava".to_string(),
            timeout_secs: 60,
            max_tokens: 1024,
            temperature: 0.1,
        }
    }
}

impl HttpVisionClientConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// JPEG 数据转为 data URL
pub fn jpeg_data_url(image: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}

/// HTTP 视觉客户端
pub struct HttpVisionClient {
    client: Client,
    config: HttpVisionClientConfig,
}

impl HttpVisionClient {
    pub fn new(config: HttpVisionClientConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(
        &'a self,
        image_url: String,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: user_prompt },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: image_url },
                        },
                    ]),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl VisionClientPort for HttpVisionClient {
    async fn analyze(
        &self,
        image: &[u8],
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AnalysisError> {
        let body = self.build_request(jpeg_data_url(image), system_prompt, user_prompt);

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            image_bytes = image.len(),
            "Sending vision request"
        );

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout
            } else if e.is_connect() {
                AnalysisError::NetworkError(format!("Cannot connect to vision service: {}", e))
            } else {
                AnalysisError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(format!("Malformed response: {}", e)))?;

        extract_content(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn extract_content(response: ChatResponse) -> Result<String, AnalysisError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AnalysisError::InvalidResponse("Response contained no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_builder() {
        let config = HttpVisionClientConfig::new("https://api.example.com/v1", "gpt-4o-mini")
            .with_api_key("sk-test")
            .with_timeout(30);
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(jpeg_data_url(&[0xFF, 0xD8]), "data:image/jpeg;base64,/9g=");
    }

    #[test]
    fn test_request_body_shape() {
        let client = HttpVisionClient::new(HttpVisionClientConfig::new(
            "http://localhost:8080/v1/",
            "llava",
        ))
        .unwrap();
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/chat/completions");

        let body = client.build_request(jpeg_data_url(&[0xFF, 0xD8]), "sys", "look");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "llava");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "sys");
        assert_eq!(value["messages"][1]["content"][0], json!({"type": "text", "text": "look"}));
        assert_eq!(
            value["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,/9g="
        );
        assert_eq!(value["messages"][1]["content"][1]["type"], "image_url");
    }

    #[test]
    fn test_extract_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"overall_status\": \"good\"}"}}]
        }))
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "{\"overall_status\": \"good\"}");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            extract_content(empty),
            Err(AnalysisError::InvalidResponse(_))
        ));

        let blank: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "  "}}]})).unwrap();
        assert!(extract_content(blank).is_err());
    }
}
