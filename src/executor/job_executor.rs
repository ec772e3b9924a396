// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::ErrorMonitor;
use crate::domain::models::job::{Job, ScrapeType};
use crate::domain::models::job_result::JobResult;
use crate::domain::models::notification::{EventType, NotificationMessage};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::{JobRepository, ResultRepository};
use crate::domain::services::notification_service::NotificationService;
use crate::domain::services::scrape_service::{ScrapeOutcome, ScrapeService};
use crate::realtime::events::{
    progress_topic, ExecutionEvent, ExecutionPhase, ProgressEvent, ALL_JOBS_TOPIC,
};
use crate::realtime::hub::EventHub;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::validators::validate_scrape_url;

/// 执行器错误类型
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// 任务不存在
    #[error("Job not found")]
    NotFound,
    /// 任务已在运行中，并发触发时只有一个执行者获胜
    #[error("Job is already running")]
    AlreadyRunning,
    /// 输入验证失败
    #[error("Validation error: {0}")]
    Validation(String),
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ExecutorError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExecutorError::NotFound,
            RepositoryError::AlreadyRunning => ExecutorError::AlreadyRunning,
            other => ExecutorError::Repository(other),
        }
    }
}

/// 任务执行器
///
/// 负责一次任务执行的完整编排：认领、AI抓取、结果持久化、
/// 终态转换、事件发布和通知分发。同一任务的并发执行被认领
/// 步骤排除；取消通过watch通道与AI调用竞争，取消的任务停在
/// paused 状态并留下一条失败结果。
pub struct JobExecutor {
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    scrape_service: Arc<ScrapeService>,
    hub: EventHub,
    notifications: Arc<NotificationService>,
    error_monitor: Arc<ErrorMonitor>,
    /// 进行中执行的取消通道
    cancellations: DashMap<Uuid, watch::Sender<bool>>,
    result_write_retry: RetryPolicy,
}

impl JobExecutor {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        scrape_service: Arc<ScrapeService>,
        hub: EventHub,
        notifications: Arc<NotificationService>,
        error_monitor: Arc<ErrorMonitor>,
    ) -> Self {
        Self {
            jobs,
            results,
            scrape_service,
            hub,
            notifications,
            error_monitor,
            cancellations: DashMap::new(),
            result_write_retry: RetryPolicy::fast(),
        }
    }

    /// 执行一次任务
    ///
    /// 认领失败（不存在或已在运行）不产生任何副作用。
    /// 认领之后的任何错误都被兜底处理：任务强制进入 failed，
    /// 尽力写入一条失败结果。每次返回都恰好留下一条新结果。
    #[instrument(skip(self, account_email), fields(job_id = %job_id))]
    pub async fn execute(
        &self,
        job_id: Uuid,
        account_email: &str,
    ) -> Result<JobResult, ExecutorError> {
        let job = self.jobs.claim_for_run(job_id).await?;
        info!(url = %job.url, "job claimed for execution");
        metrics::counter!("job_executions_total").increment(1);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.cancellations.insert(job_id, cancel_tx);

        let started = Instant::now();
        let outcome = self
            .run_claimed(&job, cancel_rx, started, account_email)
            .await;
        self.cancellations.remove(&job_id);

        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                // 兜底：任务强制失败，尽力留下失败结果
                self.error_monitor
                    .handle(&err, Some("job_executor".to_string()));
                let result = JobResult::failure(
                    job_id,
                    err.to_string(),
                    started.elapsed().as_millis() as i64,
                );
                if let Err(write_err) = self.results.insert(&result).await {
                    error!("failed to write fallback result: {}", write_err);
                }
                self.force_fail(job_id).await;
                self.publish(
                    ExecutionEvent::new(job_id, ExecutionPhase::Failed)
                        .with_execution(result.id)
                        .with_message(err.to_string()),
                );
                Ok(result)
            }
        }
    }

    async fn run_claimed(
        &self,
        job: &Job,
        mut cancel_rx: watch::Receiver<bool>,
        started: Instant,
        account_email: &str,
    ) -> anyhow::Result<JobResult> {
        self.publish(ExecutionEvent::new(job.id, ExecutionPhase::Started));
        self.progress(job.id, "claimed", Some(10));

        self.publish(ExecutionEvent::new(job.id, ExecutionPhase::Scraping));
        self.progress(job.id, "scraping", Some(30));

        let scraped = tokio::select! {
            result = self.scrape_service.scrape(job) => Some(result),
            _ = Self::cancelled(&mut cancel_rx) => None,
        };

        let Some(scraped) = scraped else {
            return self.finish_cancelled(job, started).await;
        };

        let duration_ms = started.elapsed().as_millis() as i64;
        match scraped {
            Ok(outcome) => {
                self.finish_success(job, outcome, duration_ms, account_email)
                    .await
            }
            Err(err) => self.finish_failure(job, err, duration_ms, account_email).await,
        }
    }

    async fn cancelled(rx: &mut watch::Receiver<bool>) {
        // 发送端掉线视为不再可取消，永久挂起
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }

    async fn finish_success(
        &self,
        job: &Job,
        outcome: ScrapeOutcome,
        duration_ms: i64,
        account_email: &str,
    ) -> anyhow::Result<JobResult> {
        self.publish(ExecutionEvent::new(job.id, ExecutionPhase::Persisting));
        self.progress(job.id, "persisting", Some(80));

        let result = JobResult::success(job.id, outcome.data, duration_ms, outcome.token_usage);
        // AI调用已经花费了真金白银，结果写入失败值得重试
        let stored = self
            .result_write_retry
            .run(|| async { self.results.insert(&result).await })
            .await?;

        let completed = job.clone().complete()?;
        self.jobs.update(&completed).await?;

        metrics::histogram!("job_execution_duration_ms").record(duration_ms as f64);
        info!(
            execution_id = %stored.id,
            duration_ms,
            fallback = outcome.fallback,
            "job execution completed"
        );

        self.publish(
            ExecutionEvent::new(job.id, ExecutionPhase::Completed).with_execution(stored.id),
        );
        self.progress(job.id, "completed", Some(100));

        self.notify(
            job,
            account_email,
            EventType::JobCompleted,
            NotificationMessage {
                title: format!("Job \"{}\" completed", job.name),
                body: format!("Scrape of {} finished in {} ms.", job.url, duration_ms),
                timestamp: chrono::Utc::now(),
                job_id: Some(job.id),
                execution_id: Some(stored.id),
                metadata: Some(json!({ "fallback": outcome.fallback })),
            },
        )
        .await;

        Ok(stored)
    }

    async fn finish_failure(
        &self,
        job: &Job,
        err: anyhow::Error,
        duration_ms: i64,
        account_email: &str,
    ) -> anyhow::Result<JobResult> {
        warn!("job execution failed: {}", err);
        self.error_monitor
            .handle(&err, Some("job_executor".to_string()));

        let result = JobResult::failure(job.id, err.to_string(), duration_ms);
        let stored = self
            .result_write_retry
            .run(|| async { self.results.insert(&result).await })
            .await?;

        let failed = job.clone().fail()?;
        self.jobs.update(&failed).await?;

        self.publish(
            ExecutionEvent::new(job.id, ExecutionPhase::Failed)
                .with_execution(stored.id)
                .with_message(err.to_string()),
        );
        self.progress(job.id, "failed", None);

        self.notify(
            job,
            account_email,
            EventType::JobFailed,
            NotificationMessage {
                title: format!("Job \"{}\" failed", job.name),
                body: err.to_string(),
                timestamp: chrono::Utc::now(),
                job_id: Some(job.id),
                execution_id: Some(stored.id),
                metadata: None,
            },
        )
        .await;

        Ok(stored)
    }

    async fn finish_cancelled(&self, job: &Job, started: Instant) -> anyhow::Result<JobResult> {
        info!("job execution cancelled by user");
        let result = JobResult::failure(
            job.id,
            "cancelled by user".to_string(),
            started.elapsed().as_millis() as i64,
        );
        let stored = self
            .result_write_retry
            .run(|| async { self.results.insert(&result).await })
            .await?;

        // 取消的任务停在 paused，恢复需要显式 resume
        let paused = job.clone().pause()?;
        self.jobs.update(&paused).await?;

        self.publish(
            ExecutionEvent::new(job.id, ExecutionPhase::Cancelled)
                .with_execution(stored.id)
                .with_message("cancelled by user"),
        );
        self.progress(job.id, "cancelled", None);
        metrics::counter!("job_cancellations_total").increment(1);

        Ok(stored)
    }

    /// 取消一次进行中的执行
    ///
    /// 任务没有进行中的执行时返回 `false`。
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.cancellations.get(&job_id) {
            Some(tx) => tx.send(true).is_ok(),
            None => false,
        }
    }

    /// 试运行
    ///
    /// 解析提示词并调用AI，但不认领任务、不持久化结果、
    /// 不改变任何任务状态。
    pub async fn test_run(
        &self,
        url: &str,
        scrape_type: ScrapeType,
        prompt: Option<String>,
        use_vision: bool,
    ) -> Result<ScrapeOutcome, ExecutorError> {
        validate_scrape_url(url).map_err(|e| ExecutorError::Validation(e.to_string()))?;

        let mut probe = Job::new(
            Uuid::new_v4(),
            "test run".to_string(),
            url.to_string(),
            scrape_type,
        );
        probe.ai_prompt = prompt;
        probe.use_vision = use_vision;

        let outcome = self.scrape_service.scrape(&probe).await?;
        Ok(outcome)
    }

    async fn force_fail(&self, job_id: Uuid) {
        match self.jobs.find_by_id(job_id).await {
            Ok(Some(job)) => {
                if let Ok(failed) = job.fail() {
                    if let Err(err) = self.jobs.update(&failed).await {
                        error!("failed to mark job as failed: {}", err);
                    }
                }
            }
            Ok(None) => {}
            Err(err) => error!("failed to load job for failure transition: {}", err),
        }
    }

    fn publish(&self, event: ExecutionEvent) {
        match serde_json::to_value(&event) {
            Ok(value) => {
                self.hub.publish(&event.topic(), value.clone());
                self.hub.publish(ALL_JOBS_TOPIC, value);
            }
            Err(err) => warn!("failed to serialize execution event: {}", err),
        }
    }

    fn progress(&self, job_id: Uuid, stage: &str, percent: Option<u8>) {
        let event = ProgressEvent::new(job_id, stage, percent);
        if let Ok(value) = serde_json::to_value(&event) {
            self.hub.publish(&progress_topic(job_id), value);
        }
    }

    async fn notify(
        &self,
        job: &Job,
        account_email: &str,
        event: EventType,
        message: NotificationMessage,
    ) {
        // 通知失败不影响执行结果
        if let Err(err) = self
            .notifications
            .dispatch(job.user_id, account_email, event, &message)
            .await
        {
            warn!("notification dispatch failed: {}", err);
        }
    }
}
