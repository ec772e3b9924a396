// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use uuid::Uuid;

use scrapeloom::config::settings::AiSettings;
use scrapeloom::domain::models::job::{Job, JobStatus, ScrapeType};
use scrapeloom::domain::models::job_result::ResultStatus;
use scrapeloom::infrastructure::ai::OpenAiClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::build_executor;

fn ai_settings(base_url: &str) -> AiSettings {
    AiSettings {
        api_key: "test-key".to_string(),
        api_base_url: base_url.to_string(),
        default_model: "gpt-4o-mini".to_string(),
        vision_model: "gpt-4o".to_string(),
        request_timeout: 5,
    }
}

/// 全链路：HTTP AI客户端 → 抓取服务 → 执行器 → 结果仓库
#[tokio::test]
async fn test_full_pipeline_against_mock_ai_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "```json\n{\"price\": 19.99, \"currency\": \"EUR\"}\n```"}}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 18, "total_tokens": 138}
        })))
        .mount(&server)
        .await;

    let client = Arc::new(OpenAiClient::new(&ai_settings(&server.uri())).unwrap());
    let app = build_executor(client);

    let job = Job::new(
        Uuid::new_v4(),
        "eur price".to_string(),
        "https://shop.example.com/item".to_string(),
        ScrapeType::Price,
    );
    app.jobs.insert(job.clone());

    let result = app.executor.execute(job.id, "user@example.com").await.unwrap();

    assert_eq!(result.status, ResultStatus::Success);
    assert_eq!(result.data["price"], 19.99);
    assert_eq!(result.data["currency"], "EUR");
    assert_eq!(result.token_usage.prompt_tokens, 120);
    assert_eq!(result.token_usage.total_tokens, 138);
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Completed);
}

/// 上游返回限流错误时，执行降级为失败结果且分类为可恢复
#[tokio::test]
async fn test_upstream_rate_limit_is_classified_recoverable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .mount(&server)
        .await;

    let client = Arc::new(OpenAiClient::new(&ai_settings(&server.uri())).unwrap());
    let app = build_executor(client);

    let job = Job::new(
        Uuid::new_v4(),
        "limited".to_string(),
        "https://example.com".to_string(),
        ScrapeType::General,
    );
    app.jobs.insert(job.clone());

    let result = app.executor.execute(job.id, "").await.unwrap();
    assert_eq!(result.status, ResultStatus::Failed);

    let errors = app.error_monitor.recent();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.recoverable));
}
