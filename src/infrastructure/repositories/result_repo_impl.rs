// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_result::JobResult;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::ai_client::TokenUsage;
use crate::infrastructure::database::entities::job_result as result_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 执行结果仓库实现
#[derive(Clone)]
pub struct ResultRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ResultRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<result_entity::Model> for JobResult {
    fn from(model: result_entity::Model) -> Self {
        let prompt_tokens = model.prompt_tokens.max(0) as u32;
        let completion_tokens = model.completion_tokens.max(0) as u32;
        Self {
            id: model.id,
            job_id: model.job_id,
            status: model.status.parse().unwrap_or_default(),
            data: model.data,
            error_message: model.error_message,
            duration_ms: model.duration_ms,
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            scraped_at: model.scraped_at,
        }
    }
}

impl From<JobResult> for result_entity::ActiveModel {
    fn from(result: JobResult) -> Self {
        Self {
            id: Set(result.id),
            job_id: Set(result.job_id),
            status: Set(result.status.to_string()),
            data: Set(result.data),
            error_message: Set(result.error_message),
            duration_ms: Set(result.duration_ms),
            prompt_tokens: Set(result.token_usage.prompt_tokens as i32),
            completion_tokens: Set(result.token_usage.completion_tokens as i32),
            scraped_at: Set(result.scraped_at),
        }
    }
}

#[async_trait]
impl ResultRepository for ResultRepositoryImpl {
    async fn insert(&self, result: &JobResult) -> Result<JobResult, RepositoryError> {
        let model: result_entity::ActiveModel = result.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(result.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobResult>, RepositoryError> {
        let model = result_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_job_id(
        &self,
        job_id: Uuid,
        limit: u64,
    ) -> Result<Vec<JobResult>, RepositoryError> {
        let models = result_entity::Entity::find()
            .filter(result_entity::Column::JobId.eq(job_id))
            .order_by_desc(result_entity::Column::ScrapedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_latest(&self, job_id: Uuid) -> Result<Option<JobResult>, RepositoryError> {
        let model = result_entity::Entity::find()
            .filter(result_entity::Column::JobId.eq(job_id))
            .order_by_desc(result_entity::Column::ScrapedAt)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn delete_by_job_id(&self, job_id: Uuid) -> Result<u64, RepositoryError> {
        let result = result_entity::Entity::delete_many()
            .filter(result_entity::Column::JobId.eq(job_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
