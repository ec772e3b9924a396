// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_result::JobResult;
use async_trait::async_trait;
use uuid::Uuid;

use super::job_repository::RepositoryError;

/// 执行结果仓库特质
///
/// 结果记录只追加，不更新。
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 保存一次执行的结果
    async fn insert(&self, result: &JobResult) -> Result<JobResult, RepositoryError>;
    /// 根据ID查找结果
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobResult>, RepositoryError>;
    /// 按任务查找结果，按抓取时间倒序
    async fn find_by_job_id(
        &self,
        job_id: Uuid,
        limit: u64,
    ) -> Result<Vec<JobResult>, RepositoryError>;
    /// 任务最近一次执行的结果
    async fn find_latest(&self, job_id: Uuid) -> Result<Option<JobResult>, RepositoryError>;
    /// 删除任务的所有结果
    async fn delete_by_job_id(&self, job_id: Uuid) -> Result<u64, RepositoryError>;
}
