// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus, ScrapeType};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 抢占失败，任务已在运行中
    #[error("Job is already running")]
    AlreadyRunning,
}

/// 任务查询参数
#[derive(Debug, Default, Clone)]
pub struct JobQueryParams {
    pub user_id: Uuid,
    pub job_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<JobStatus>>,
    pub scrape_types: Option<Vec<ScrapeType>>,
    pub created_after: Option<DateTime<FixedOffset>>,
    pub created_before: Option<DateTime<FixedOffset>>,
    pub limit: u32,
    pub offset: u32,
}

/// 任务仓库特质
///
/// 定义抓取任务的数据访问接口
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 更新任务
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 删除任务
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 抢占任务用于执行
    ///
    /// 原子地将可抢占状态（pending、completed、failed）的任务置为
    /// running 并写入 last_run_at。任务已在 running 或 paused 状态时
    /// 返回 `AlreadyRunning`，保证并发触发下只有一个执行者获胜。
    async fn claim_for_run(&self, id: Uuid) -> Result<Job, RepositoryError>;
    /// 查找到期的定时任务
    ///
    /// 返回 schedule_enabled 且 next_run_at <= now 且处于可抢占
    /// 状态的任务。
    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Job>, RepositoryError>;
    /// 重置卡住的任务（长时间处于Running状态）
    async fn reset_stuck_jobs(&self, timeout: chrono::Duration) -> Result<u64, RepositoryError>;
    /// 高级任务查询
    async fn query_jobs(&self, params: JobQueryParams) -> Result<(Vec<Job>, u64), RepositoryError>;
}
