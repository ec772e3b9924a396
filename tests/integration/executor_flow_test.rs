// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use scrapeloom::domain::models::job::{Job, JobStatus, ScrapeType};
use scrapeloom::domain::models::job_result::ResultStatus;
use scrapeloom::executor::ExecutorError;
use scrapeloom::realtime::events::job_topic;

use super::helpers::{build_executor, CannedAiClient};

fn price_job(jobs: &super::helpers::InMemoryJobRepository) -> Job {
    let job = Job::new(
        Uuid::new_v4(),
        "price watch".to_string(),
        "https://shop.example.com/item/42".to_string(),
        ScrapeType::Price,
    );
    jobs.insert(job.clone());
    job
}

#[tokio::test]
async fn test_price_job_scenario_extracts_structured_price() {
    let app = build_executor(Arc::new(CannedAiClient::ok(r#"{"price": 19.99}"#)));
    let job = price_job(&app.jobs);

    let result = app.executor.execute(job.id, "user@example.com").await.unwrap();

    assert_eq!(result.status, ResultStatus::Success);
    assert_eq!(result.data["price"], 19.99);
    assert_eq!(result.token_usage.total_tokens, 15);
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Completed);
    assert_eq!(app.results.count(), 1);
}

#[tokio::test]
async fn test_markdown_fenced_response_is_parsed() {
    let app = build_executor(Arc::new(CannedAiClient::ok(
        "```json\n{\"price\": 5.0, \"currency\": \"USD\"}\n```",
    )));
    let job = price_job(&app.jobs);

    let result = app.executor.execute(job.id, "").await.unwrap();
    assert_eq!(result.data["currency"], "USD");
}

#[tokio::test]
async fn test_non_json_response_degrades_to_wrapped_success() {
    let app = build_executor(Arc::new(CannedAiClient::ok("The price is about twenty.")));
    let job = price_job(&app.jobs);

    let result = app.executor.execute(job.id, "").await.unwrap();

    assert_eq!(result.status, ResultStatus::Success);
    assert_eq!(result.data["extracted_content"], "The price is about twenty.");
    assert_eq!(result.data["extraction_type"], "text_content");
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_ai_failure_yields_failed_result_without_throwing() {
    let app = build_executor(Arc::new(CannedAiClient::failing(
        "connection refused by upstream",
    )));
    let job = price_job(&app.jobs);

    // 适配层永不抛出：AI失败变成一条失败结果
    let result = app.executor.execute(job.id, "").await.unwrap();

    assert_eq!(result.status, ResultStatus::Failed);
    assert!(result.error_message.is_some());
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Failed);
    assert_eq!(app.results.count(), 1);
    assert!(!app.error_monitor.recent().is_empty());
}

#[tokio::test]
async fn test_each_execution_leaves_exactly_one_result() {
    let app = build_executor(Arc::new(CannedAiClient::ok(r#"{"ok": true}"#)));
    let job = price_job(&app.jobs);

    for run in 1..=3 {
        app.executor.execute(job.id, "").await.unwrap();
        assert_eq!(app.results.count(), run);
    }
}

#[tokio::test]
async fn test_execute_missing_job_returns_not_found() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));
    let err = app.executor.execute(Uuid::new_v4(), "").await.unwrap_err();
    assert!(matches!(err, ExecutorError::NotFound));
    assert_eq!(app.results.count(), 0);
}

#[tokio::test]
async fn test_claim_rejects_running_job() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));
    let mut job = price_job(&app.jobs);
    job.status = JobStatus::Running;
    app.jobs.insert(job.clone());

    let err = app.executor.execute(job.id, "").await.unwrap_err();
    assert!(matches!(err, ExecutorError::AlreadyRunning));
    // 认领失败无副作用
    assert_eq!(app.results.count(), 0);
}

#[tokio::test]
async fn test_concurrent_execution_has_exactly_one_winner() {
    let app = build_executor(Arc::new(CannedAiClient::slow(
        r#"{"ok": true}"#,
        Duration::from_millis(100),
    )));
    let job = price_job(&app.jobs);

    let a = {
        let executor = app.executor.clone();
        let id = job.id;
        tokio::spawn(async move { executor.execute(id, "").await })
    };
    let b = {
        let executor = app.executor.clone();
        let id = job.id;
        tokio::spawn(async move { executor.execute(id, "").await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    let losers = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(ExecutorError::AlreadyRunning)))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(losers, 1);
    assert_eq!(app.results.count(), 1);
}

#[tokio::test]
async fn test_cancellation_pauses_job_and_records_failure() {
    let app = build_executor(Arc::new(CannedAiClient::slow(
        r#"{"ok": true}"#,
        Duration::from_secs(5),
    )));
    let job = price_job(&app.jobs);

    let handle = {
        let executor = app.executor.clone();
        let id = job.id;
        tokio::spawn(async move { executor.execute(id, "").await })
    };

    // 等执行进入抓取阶段再取消
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(app.executor.cancel(job.id));

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.status, ResultStatus::Failed);
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Paused);
    assert_eq!(app.results.count(), 1);
}

#[tokio::test]
async fn test_cancel_returns_false_when_nothing_running() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));
    assert!(!app.executor.cancel(Uuid::new_v4()));
}

#[tokio::test]
async fn test_execution_publishes_lifecycle_events() {
    let app = build_executor(Arc::new(CannedAiClient::ok(r#"{"ok": true}"#)));
    let job = price_job(&app.jobs);

    let mut rx = app.hub.subscribe(&job_topic(job.id));
    app.executor.execute(job.id, "").await.unwrap();

    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Some(phase) = event.get("phase").and_then(|p| p.as_str()) {
            phases.push(phase.to_string());
        }
    }
    assert!(phases.contains(&"started".to_string()));
    assert!(phases.contains(&"completed".to_string()));
}

#[tokio::test]
async fn test_test_run_does_not_persist_or_claim() {
    let app = build_executor(Arc::new(CannedAiClient::ok(r#"{"price": 3.5}"#)));
    let job = price_job(&app.jobs);

    let outcome = app
        .executor
        .test_run("https://example.com/page", ScrapeType::Price, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.data["price"], 3.5);
    assert_eq!(app.results.count(), 0);
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Pending);
}

#[tokio::test]
async fn test_test_run_rejects_invalid_url() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));
    let err = app
        .executor
        .test_run("ftp://example.com", ScrapeType::General, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Validation(_)));
}
