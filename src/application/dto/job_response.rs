// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::job::{Job, JobConfig, JobStatus, ScrapeType};
use crate::domain::models::job_result::{JobResult, ResultStatus};
use crate::domain::models::schedule::ScheduleConfig;
use crate::domain::services::ai_client::TokenUsage;
use crate::domain::services::scrape_service::ScrapeOutcome;

/// 任务响应DTO
#[derive(Debug, Serialize)]
pub struct JobResponseDto {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub status: JobStatus,
    pub scrape_type: ScrapeType,
    pub ai_prompt: Option<String>,
    pub use_vision: bool,
    pub ai_model: Option<String>,
    pub schedule_enabled: bool,
    pub schedule: Option<ScheduleConfig>,
    pub next_run_at: Option<DateTime<FixedOffset>>,
    pub config: JobConfig,
    pub last_run_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<Job> for JobResponseDto {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            name: job.name,
            url: job.url,
            status: job.status,
            scrape_type: job.scrape_type,
            ai_prompt: job.ai_prompt,
            use_vision: job.use_vision,
            ai_model: job.ai_model,
            schedule_enabled: job.schedule_enabled,
            schedule: job.schedule,
            next_run_at: job.next_run_at,
            config: job.config,
            last_run_at: job.last_run_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// 任务列表响应DTO
#[derive(Debug, Serialize)]
pub struct JobListResponseDto {
    pub jobs: Vec<JobResponseDto>,
    pub total: u64,
    pub has_more: bool,
}

/// 执行结果响应DTO
#[derive(Debug, Serialize)]
pub struct JobResultDto {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: ResultStatus,
    pub data: serde_json::Value,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub token_usage: TokenUsage,
    pub scraped_at: DateTime<FixedOffset>,
}

impl From<JobResult> for JobResultDto {
    fn from(result: JobResult) -> Self {
        Self {
            id: result.id,
            job_id: result.job_id,
            status: result.status,
            data: result.data,
            error_message: result.error_message,
            duration_ms: result.duration_ms,
            token_usage: result.token_usage,
            scraped_at: result.scraped_at,
        }
    }
}

/// 试运行响应DTO
#[derive(Debug, Serialize)]
pub struct TestRunResponseDto {
    pub data: serde_json::Value,
    pub fallback: bool,
    pub token_usage: TokenUsage,
}

impl From<ScrapeOutcome> for TestRunResponseDto {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            data: outcome.data,
            fallback: outcome.fallback,
            token_usage: outcome.token_usage,
        }
    }
}
