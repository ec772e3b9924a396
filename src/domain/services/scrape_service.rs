// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::models::job::{Job, ScrapeType};
use crate::domain::services::ai_client::{AiClient, TokenUsage};

/// 一次AI抓取的产出
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// 提取到的数据
    pub data: Value,
    /// 令牌使用情况
    pub token_usage: TokenUsage,
    /// 是否经过纯文本降级包装
    pub fallback: bool,
}

/// AI抓取服务
///
/// 根据任务配置组装提示词，调用AI补全接口并把返回内容
/// 解析为结构化数据。AI返回的非JSON文本不视为失败，
/// 而是降级包装为固定形态的文本结果。
pub struct ScrapeService {
    ai_client: Arc<dyn AiClient>,
    default_model: String,
    vision_model: String,
}

impl ScrapeService {
    pub fn new(ai_client: Arc<dyn AiClient>, default_model: String, vision_model: String) -> Self {
        Self {
            ai_client,
            default_model,
            vision_model,
        }
    }

    /// 任务的生效模型
    ///
    /// 显式配置优先；未配置时视觉任务用视觉模型，否则用默认模型。
    pub fn resolve_model<'a>(&'a self, job: &'a Job) -> &'a str {
        if let Some(model) = job.ai_model.as_deref().filter(|m| !m.is_empty()) {
            model
        } else if job.use_vision {
            &self.vision_model
        } else {
            &self.default_model
        }
    }

    /// 抓取类型的默认提示词模板
    pub fn default_prompt(scrape_type: ScrapeType) -> &'static str {
        match scrape_type {
            ScrapeType::General => {
                "Extract the main structured information from this page. \
                 Return a JSON object summarising its key content."
            }
            ScrapeType::Product => {
                "Extract the product name, price, currency, availability and \
                 primary image URL from this product page. Return a JSON object \
                 with keys: name, price, currency, in_stock, image_url."
            }
            ScrapeType::Price => {
                "Extract the current price and currency from this page. Return a \
                 JSON object with keys: price (number), currency (ISO code), \
                 in_stock (boolean)."
            }
            ScrapeType::Content => {
                "Extract the article title, author, publication date and full \
                 body text from this page. Return a JSON object with keys: \
                 title, author, published_at, body."
            }
        }
    }

    /// 组装任务的完整提示词
    ///
    /// 自定义提示词优先于类型默认模板；目标URL始终包含在内。
    pub fn build_prompt(&self, job: &Job) -> String {
        let instruction = job
            .ai_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| Self::default_prompt(job.scrape_type));
        format!(
            "You are a web scraping assistant. Visit and analyse the page at the \
             given URL, then perform the task below.\n\
             URL: {}\n\
             Task: {}\n\
             Return ONLY a valid JSON object, no markdown formatting.",
            job.url, instruction
        )
    }

    /// 执行一次AI抓取
    pub async fn scrape(&self, job: &Job) -> Result<ScrapeOutcome> {
        let prompt = self.build_prompt(job);
        let model = self.resolve_model(job);
        let (text, token_usage) = self
            .ai_client
            .generate(&prompt, Some(model))
            .await
            .context("AI completion failed")?;
        Ok(Self::interpret(&text, &job.url, token_usage))
    }

    /// 解析AI返回文本
    ///
    /// 去除可能的markdown代码围栏后尝试严格JSON解析；
    /// 解析失败时降级包装为文本结果，包装是幂等的：
    /// 已是JSON对象的内容永远不会被二次包装。
    pub fn interpret(text: &str, url: &str, token_usage: TokenUsage) -> ScrapeOutcome {
        let clean = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        match serde_json::from_str::<Value>(clean) {
            Ok(data) if data.is_object() || data.is_array() => ScrapeOutcome {
                data,
                token_usage,
                fallback: false,
            },
            _ => ScrapeOutcome {
                data: json!({
                    "extracted_content": clean,
                    "url": url,
                    "extraction_type": "text_content",
                    "timestamp": Utc::now().to_rfc3339(),
                }),
                token_usage,
                fallback: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct CannedClient {
        reply: String,
    }

    #[async_trait]
    impl AiClient for CannedClient {
        async fn generate(&self, _prompt: &str, _model: Option<&str>) -> Result<(String, TokenUsage)> {
            Ok((
                self.reply.clone(),
                TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            ))
        }
    }

    fn service(reply: &str) -> ScrapeService {
        ScrapeService::new(
            Arc::new(CannedClient {
                reply: reply.to_string(),
            }),
            "gpt-4o-mini".to_string(),
            "gpt-4o".to_string(),
        )
    }

    fn job() -> Job {
        Job::new(
            Uuid::new_v4(),
            "test".to_string(),
            "https://example.com".to_string(),
            ScrapeType::Price,
        )
    }

    #[tokio::test]
    async fn test_valid_json_reply_is_structured() {
        let outcome = service(r#"{"price": 19.99, "currency": "USD"}"#)
            .scrape(&job())
            .await
            .unwrap();
        assert!(!outcome.fallback);
        assert_eq!(outcome.data["price"], json!(19.99));
        assert_eq!(outcome.token_usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_fenced_json_is_unwrapped() {
        let outcome = service("```json\n{\"price\": 5}\n```")
            .scrape(&job())
            .await
            .unwrap();
        assert!(!outcome.fallback);
        assert_eq!(outcome.data["price"], json!(5));
    }

    #[tokio::test]
    async fn test_plain_text_reply_is_wrapped_not_failed() {
        let outcome = service("The price appears to be around twenty dollars.")
            .scrape(&job())
            .await
            .unwrap();
        assert!(outcome.fallback);
        assert_eq!(outcome.data["extraction_type"], json!("text_content"));
        assert_eq!(outcome.data["url"], json!("https://example.com"));
        assert!(outcome.data["extracted_content"]
            .as_str()
            .unwrap()
            .contains("twenty dollars"));
    }

    #[test]
    fn test_wrap_is_idempotent() {
        // 包装结果本身是合法JSON对象，再次解读不会二次包装
        let first = ScrapeService::interpret("not json", "https://e.com", TokenUsage::default());
        assert!(first.fallback);
        let serialized = serde_json::to_string(&first.data).unwrap();
        let second = ScrapeService::interpret(&serialized, "https://e.com", TokenUsage::default());
        assert!(!second.fallback);
        assert_eq!(second.data, first.data);
    }

    #[test]
    fn test_custom_prompt_overrides_template() {
        let svc = service("{}");
        let mut j = job();
        j.ai_prompt = Some("Find the big number.".to_string());
        let prompt = svc.build_prompt(&j);
        assert!(prompt.contains("Find the big number."));
        assert!(prompt.contains("https://example.com"));
    }

    #[test]
    fn test_model_resolution_prefers_explicit_then_vision() {
        let svc = service("{}");
        let mut j = job();
        assert_eq!(svc.resolve_model(&j), "gpt-4o-mini");
        j.use_vision = true;
        assert_eq!(svc.resolve_model(&j), "gpt-4o");
        j.ai_model = Some("custom-model".to_string());
        assert_eq!(svc.resolve_model(&j), "custom-model");
    }
}
