// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::settings::AiSettings;
use crate::domain::services::ai_client::{AiClient, TokenUsage};

/// OpenAI兼容的补全客户端
///
/// # 配置
///
/// 通过 `AiSettings` 配置：
/// - `api_key` - API密钥（必填）
/// - `api_base_url` - 基础URL，测试中可指向本地mock服务
/// - `default_model` - 默认模型名称
/// - `request_timeout` - 每次调用的超时（秒）
pub struct OpenAiClient {
    api_key: String,
    default_model: String,
    api_base_url: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .context("failed to build AI HTTP client")?;
        Ok(Self {
            api_key: settings.api_key.clone(),
            default_model: settings.default_model.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn parse_usage(body: &Value) -> TokenUsage {
        match body.get("usage") {
            Some(usage) => TokenUsage {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0) as u32,
            },
            None => TokenUsage::default(),
        }
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<(String, TokenUsage)> {
        let model = model.unwrap_or(&self.default_model);
        let request_body = json!({
            "model": model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.0
        });

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to AI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "AI API returned error: {} - {}",
                status,
                error_text
            ));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse AI API response")?;

        let usage = Self::parse_usage(&body);

        match body["choices"][0]["message"]["content"].as_str() {
            Some(content) => Ok((content.to_string(), usage)),
            None => Err(anyhow::anyhow!("Invalid response format from AI API")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> AiSettings {
        AiSettings {
            api_key: "test-key".to_string(),
            api_base_url: base_url.to_string(),
            default_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o".to_string(),
            request_timeout: 5,
        }
    }

    #[tokio::test]
    async fn test_generate_parses_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "{\"price\": 19.99}"}}
                ],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(&server.uri())).unwrap();
        let (text, usage) = client.generate("extract the price", None).await.unwrap();
        assert_eq!(text, "{\"price\": 19.99}");
        assert_eq!(usage.prompt_tokens, 42);
        assert_eq!(usage.completion_tokens, 7);
        assert_eq!(usage.total_tokens, 49);
    }

    #[tokio::test]
    async fn test_missing_usage_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(&server.uri())).unwrap();
        let (_, usage) = client.generate("hello", None).await.unwrap();
        assert_eq!(usage.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_api_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(&server.uri())).unwrap();
        let err = client.generate("hello", None).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_health_check_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "OK"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(&server.uri())).unwrap();
        assert!(client.health_check().await.unwrap());
    }
}
