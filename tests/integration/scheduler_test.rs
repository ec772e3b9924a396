// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use chrono::Utc;
use scrapeloom::domain::models::job::{Job, JobStatus, ScrapeType};
use scrapeloom::domain::models::schedule::{Frequency, ScheduleConfig};
use scrapeloom::domain::repositories::job_repository::JobRepository;
use scrapeloom::executor::Scheduler;

use super::helpers::{build_executor, CannedAiClient};

fn hourly_schedule() -> ScheduleConfig {
    ScheduleConfig {
        frequency: Frequency::Custom,
        time_of_day: None,
        weekdays: None,
        interval_hours: Some(1),
        timezone: "UTC".to_string(),
    }
}

#[tokio::test]
async fn test_due_job_is_triggered_and_next_run_advances() {
    let app = build_executor(Arc::new(CannedAiClient::ok(r#"{"ok": true}"#)));

    let mut job = Job::new(
        Uuid::new_v4(),
        "scheduled".to_string(),
        "https://example.com".to_string(),
        ScrapeType::General,
    );
    job.schedule_enabled = true;
    job.schedule = Some(hourly_schedule());
    job.next_run_at = Some((Utc::now() - chrono::Duration::minutes(1)).into());
    app.jobs.insert(job.clone());

    let scheduler = Arc::new(Scheduler::new(
        app.jobs.clone(),
        app.executor.clone(),
        Duration::from_secs(3600),
        chrono::Duration::minutes(30),
    ));
    scheduler.tick().await.unwrap();

    // 等被触发的执行跑完
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stored = app.jobs.get(job.id).unwrap();
    // 下次执行时间先行推进，防止同一到期时刻被重复触发
    assert!(stored.next_run_at.unwrap() > Utc::now());
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(app.results.count(), 1);
}

#[tokio::test]
async fn test_not_due_job_is_left_alone() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));

    let mut job = Job::new(
        Uuid::new_v4(),
        "future".to_string(),
        "https://example.com".to_string(),
        ScrapeType::General,
    );
    job.schedule_enabled = true;
    job.schedule = Some(hourly_schedule());
    job.next_run_at = Some((Utc::now() + chrono::Duration::hours(2)).into());
    app.jobs.insert(job.clone());

    let scheduler = Arc::new(Scheduler::new(
        app.jobs.clone(),
        app.executor.clone(),
        Duration::from_secs(3600),
        chrono::Duration::minutes(30),
    ));
    scheduler.tick().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Pending);
    assert_eq!(app.results.count(), 0);
}

#[tokio::test]
async fn test_stuck_running_job_is_reset_to_failed() {
    let app = build_executor(Arc::new(CannedAiClient::ok("{}")));

    let mut job = Job::new(
        Uuid::new_v4(),
        "stuck".to_string(),
        "https://example.com".to_string(),
        ScrapeType::General,
    );
    job.status = JobStatus::Running;
    job.updated_at = (Utc::now() - chrono::Duration::hours(2)).into();
    app.jobs.insert(job.clone());

    let reset = app
        .jobs
        .reset_stuck_jobs(chrono::Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(reset, 1);
    assert_eq!(app.jobs.get(job.id).unwrap().status, JobStatus::Failed);
}
