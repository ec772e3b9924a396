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

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::repositories::job_repository::{
    JobQueryParams, JobRepository, RepositoryError,
};
use crate::infrastructure::database::entities::job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn claimable_statuses() -> Vec<String> {
    vec![
        JobStatus::Pending.to_string(),
        JobStatus::Completed.to_string(),
        JobStatus::Failed.to_string(),
    ]
}

impl From<job_entity::Model> for Job {
    fn from(model: job_entity::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            url: model.url,
            status: model.status.parse().unwrap_or_default(),
            scrape_type: model.scrape_type.parse().unwrap_or_default(),
            ai_prompt: model.ai_prompt,
            use_vision: model.use_vision,
            ai_model: model.ai_model,
            schedule_enabled: model.schedule_enabled,
            schedule: model
                .schedule
                .and_then(|v| serde_json::from_value(v).ok()),
            next_run_at: model.next_run_at,
            config: serde_json::from_value(model.config).unwrap_or_default(),
            last_run_at: model.last_run_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Job> for job_entity::ActiveModel {
    fn from(job: Job) -> Self {
        Self {
            id: Set(job.id),
            user_id: Set(job.user_id),
            name: Set(job.name),
            url: Set(job.url),
            status: Set(job.status.to_string()),
            scrape_type: Set(job.scrape_type.to_string()),
            ai_prompt: Set(job.ai_prompt),
            use_vision: Set(job.use_vision),
            ai_model: Set(job.ai_model),
            schedule_enabled: Set(job.schedule_enabled),
            schedule: Set(job
                .schedule
                .as_ref()
                .and_then(|s| serde_json::to_value(s).ok())),
            next_run_at: Set(job.next_run_at),
            config: Set(serde_json::to_value(&job.config).unwrap_or_default()),
            last_run_at: Set(job.last_run_at),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = job_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn claim_for_run(&self, id: Uuid) -> Result<Job, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        // 条件更新充当抢占锁：只有可认领状态的行会被改写，
        // 并发触发时恰好一个UPDATE生效
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Running.to_string()),
            )
            .col_expr(job_entity::Column::LastRunAt, Expr::value(Some(now)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(job_entity::Column::Id.eq(id))
            .filter(job_entity::Column::Status.is_in(claimable_statuses()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return match self.find_by_id(id).await? {
                Some(_) => Err(RepositoryError::AlreadyRunning),
                None => Err(RepositoryError::NotFound),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::ScheduleEnabled.eq(true))
            .filter(job_entity::Column::NextRunAt.is_not_null())
            .filter(job_entity::Column::NextRunAt.lte(now))
            .filter(job_entity::Column::Status.is_in(claimable_statuses()))
            .order_by_asc(job_entity::Column::NextRunAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn reset_stuck_jobs(&self, timeout: chrono::Duration) -> Result<u64, RepositoryError> {
        let threshold = Utc::now() - timeout;

        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Failed.to_string()),
            )
            .col_expr(
                job_entity::Column::UpdatedAt,
                Expr::value(DateTime::<FixedOffset>::from(Utc::now())),
            )
            .filter(job_entity::Column::Status.eq(JobStatus::Running.to_string()))
            .filter(job_entity::Column::UpdatedAt.lt(threshold))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn query_jobs(
        &self,
        params: JobQueryParams,
    ) -> Result<(Vec<Job>, u64), RepositoryError> {
        let mut query = job_entity::Entity::find()
            .filter(job_entity::Column::UserId.eq(params.user_id));

        if let Some(ids) = &params.job_ids {
            query = query.filter(job_entity::Column::Id.is_in(ids.clone()));
        }
        if let Some(statuses) = &params.statuses {
            let values: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
            query = query.filter(job_entity::Column::Status.is_in(values));
        }
        if let Some(types) = &params.scrape_types {
            let values: Vec<String> = types.iter().map(|t| t.to_string()).collect();
            query = query.filter(job_entity::Column::ScrapeType.is_in(values));
        }

        let mut time_condition = Condition::all();
        if let Some(after) = params.created_after {
            time_condition = time_condition.add(job_entity::Column::CreatedAt.gte(after));
        }
        if let Some(before) = params.created_before {
            time_condition = time_condition.add(job_entity::Column::CreatedAt.lte(before));
        }
        query = query.filter(time_condition);

        let total = query.clone().count(self.db.as_ref()).await?;

        let mut query = query.order_by_desc(job_entity::Column::CreatedAt);
        if params.limit > 0 {
            query = query.limit(params.limit as u64);
        }
        if params.offset > 0 {
            query = query.offset(params.offset as u64);
        }

        let models = query.all(self.db.as_ref()).await?;
        Ok((models.into_iter().map(Into::into).collect(), total))
    }
}
