// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeloom::domain::models::job::{Job, JobConfig, JobStatus, KnownConfig, ScrapeType};
use uuid::Uuid;

fn job() -> Job {
    Job::new(
        Uuid::new_v4(),
        "state machine".to_string(),
        "https://example.com".to_string(),
        ScrapeType::General,
    )
}

#[test]
fn test_new_job_is_pending_and_claimable() {
    let job = job();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.status.claimable());
    assert!(job.last_run_at.is_none());
}

#[test]
fn test_start_complete_cycle() {
    let job = job().start().unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.last_run_at.is_some());

    let job = job.complete().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    // 已结束的任务可以再次被认领
    assert!(job.status.claimable());
}

#[test]
fn test_start_fail_cycle() {
    let job = job().start().unwrap().fail().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.status.claimable());
}

#[test]
fn test_running_job_cannot_start_again() {
    let job = job().start().unwrap();
    assert!(job.start().is_err());
}

#[test]
fn test_pause_and_resume() {
    let job = job().pause().unwrap();
    assert_eq!(job.status, JobStatus::Paused);
    assert!(!job.status.claimable());

    let job = job.resume().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn test_completed_job_cannot_pause() {
    let job = job().start().unwrap().complete().unwrap();
    assert!(job.pause().is_err());
}

#[test]
fn test_status_round_trips_through_strings() {
    for status in [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Paused,
    ] {
        let parsed: JobStatus = status.to_string().parse().unwrap();
        assert_eq!(parsed, status);
    }
}

#[test]
fn test_known_price_config_round_trips() {
    let config = JobConfig::Known(KnownConfig::Price {
        currency: "EUR".to_string(),
        track_stock: true,
    });
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["kind"], "price");

    let back: JobConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_unknown_config_shape_is_kept_opaque() {
    let raw = serde_json::json!({"selectors_v2": {"title": "#t"}, "experimental": true});
    let config: JobConfig = serde_json::from_value(raw.clone()).unwrap();
    match &config {
        JobConfig::Opaque(value) => assert_eq!(*value, raw),
        other => panic!("expected opaque config, got {other:?}"),
    }
    // 原样写回
    assert_eq!(serde_json::to_value(&config).unwrap(), raw);
}
