// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use scrapeloom::domain::errors::ErrorMonitor;
use scrapeloom::domain::models::job::{Job, JobStatus};
use scrapeloom::domain::models::job_result::JobResult;
use scrapeloom::domain::models::notification::{
    Channel, DeliveryReceipt, EventType, NotificationMessage, NotificationRecord,
    NotificationSettings,
};
use scrapeloom::domain::repositories::job_repository::{
    JobQueryParams, JobRepository, RepositoryError,
};
use scrapeloom::domain::repositories::notification_repository::NotificationRepository;
use scrapeloom::domain::repositories::result_repository::ResultRepository;
use scrapeloom::domain::services::ai_client::{AiClient, TokenUsage};
use scrapeloom::domain::services::notification_service::{
    NotificationDelivery, NotificationService,
};
use scrapeloom::domain::services::scrape_service::ScrapeService;
use scrapeloom::executor::JobExecutor;
use scrapeloom::realtime::EventHub;

/// 内存任务仓库
///
/// 认领在互斥锁内完成，与数据库实现一样是原子的。
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.jobs.lock().insert(job.id, job);
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().get(&id).cloned()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        self.jobs.lock().insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.lock().get(&id).cloned())
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut jobs = self.jobs.lock();
        if !jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.jobs
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn claim_for_run(&self, id: Uuid) -> Result<Job, RepositoryError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if !job.status.claimable() {
            return Err(RepositoryError::AlreadyRunning);
        }
        job.status = JobStatus::Running;
        job.last_run_at = Some(Utc::now().into());
        job.updated_at = Utc::now().into();
        Ok(job.clone())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Job>, RepositoryError> {
        let now: chrono::DateTime<chrono::FixedOffset> = now.into();
        Ok(self
            .jobs
            .lock()
            .values()
            .filter(|j| {
                j.schedule_enabled
                    && j.status.claimable()
                    && j.next_run_at.map(|t| t <= now).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn reset_stuck_jobs(&self, timeout: chrono::Duration) -> Result<u64, RepositoryError> {
        let threshold: chrono::DateTime<chrono::FixedOffset> = (Utc::now() - timeout).into();
        let mut count = 0;
        for job in self.jobs.lock().values_mut() {
            if job.status == JobStatus::Running && job.updated_at < threshold {
                job.status = JobStatus::Failed;
                job.updated_at = Utc::now().into();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn query_jobs(
        &self,
        params: JobQueryParams,
    ) -> Result<(Vec<Job>, u64), RepositoryError> {
        let jobs: Vec<Job> = self
            .jobs
            .lock()
            .values()
            .filter(|j| j.user_id == params.user_id)
            .cloned()
            .collect();
        let total = jobs.len() as u64;
        Ok((jobs, total))
    }
}

/// 内存结果仓库
#[derive(Default)]
pub struct InMemoryResultRepository {
    results: Mutex<Vec<JobResult>>,
}

impl InMemoryResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.results.lock().len()
    }

    pub fn all(&self) -> Vec<JobResult> {
        self.results.lock().clone()
    }
}

#[async_trait]
impl ResultRepository for InMemoryResultRepository {
    async fn insert(&self, result: &JobResult) -> Result<JobResult, RepositoryError> {
        self.results.lock().push(result.clone());
        Ok(result.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobResult>, RepositoryError> {
        Ok(self.results.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_job_id(
        &self,
        job_id: Uuid,
        limit: u64,
    ) -> Result<Vec<JobResult>, RepositoryError> {
        let mut found: Vec<JobResult> = self
            .results
            .lock()
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn find_latest(&self, job_id: Uuid) -> Result<Option<JobResult>, RepositoryError> {
        Ok(self
            .find_by_job_id(job_id, 1)
            .await?
            .into_iter()
            .next())
    }

    async fn delete_by_job_id(&self, job_id: Uuid) -> Result<u64, RepositoryError> {
        let mut results = self.results.lock();
        let before = results.len();
        results.retain(|r| r.job_id != job_id);
        Ok((before - results.len()) as u64)
    }
}

/// 返回固定文本的AI客户端
pub struct CannedAiClient {
    response: String,
    fail: bool,
    delay: Option<Duration>,
}

impl CannedAiClient {
    pub fn ok(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail: false,
            delay: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: message.to_string(),
            fail: true,
            delay: None,
        }
    }

    pub fn slow(response: &str, delay: Duration) -> Self {
        Self {
            response: response.to_string(),
            fail: false,
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl AiClient for CannedAiClient {
    async fn generate(&self, _prompt: &str, _model: Option<&str>) -> Result<(String, TokenUsage)> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("{}", self.response);
        }
        Ok((
            self.response.clone(),
            TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        ))
    }
}

/// 无设置的通知仓库，派发时直接跳过
#[derive(Default)]
struct NoSettingsNotificationRepository;

#[async_trait]
impl NotificationRepository for NoSettingsNotificationRepository {
    async fn get_settings(
        &self,
        _user_id: Uuid,
    ) -> Result<Option<NotificationSettings>, RepositoryError> {
        Ok(None)
    }

    async fn upsert_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, RepositoryError> {
        Ok(settings.clone())
    }

    async fn record(
        &self,
        record: &NotificationRecord,
    ) -> Result<NotificationRecord, RepositoryError> {
        Ok(record.clone())
    }

    async fn count_since(
        &self,
        _user_id: Uuid,
        _channel: Channel,
        _since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    async fn find_recent(
        &self,
        _user_id: Uuid,
        _limit: u64,
    ) -> Result<Vec<NotificationRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

struct NoopDelivery;

#[async_trait]
impl NotificationDelivery for NoopDelivery {
    async fn deliver(
        &self,
        _event: EventType,
        _channel: Channel,
        _recipient: &str,
        _message: &NotificationMessage,
    ) -> Result<DeliveryReceipt> {
        Ok(DeliveryReceipt {
            success: true,
            message: "ok".to_string(),
            sent: 1,
            queued: None,
            details: None,
        })
    }
}

/// 组装一个跑在内存仓库上的执行器
pub struct TestExecutor {
    pub executor: Arc<JobExecutor>,
    pub jobs: Arc<InMemoryJobRepository>,
    pub results: Arc<InMemoryResultRepository>,
    pub hub: EventHub,
    pub error_monitor: Arc<ErrorMonitor>,
}

pub fn build_executor(ai_client: Arc<dyn AiClient>) -> TestExecutor {
    let jobs = Arc::new(InMemoryJobRepository::new());
    let results = Arc::new(InMemoryResultRepository::new());
    let hub = EventHub::new();
    let error_monitor = Arc::new(ErrorMonitor::new());

    let scrape_service = Arc::new(ScrapeService::new(
        ai_client,
        "gpt-4o-mini".to_string(),
        "gpt-4o".to_string(),
    ));
    let notifications = Arc::new(NotificationService::new(
        Arc::new(NoSettingsNotificationRepository),
        Arc::new(NoopDelivery),
    ));

    let executor = Arc::new(JobExecutor::new(
        jobs.clone(),
        results.clone(),
        scrape_service,
        hub.clone(),
        notifications,
        error_monitor.clone(),
    ));

    TestExecutor {
        executor,
        jobs,
        results,
        hub,
        error_monitor,
    }
}
