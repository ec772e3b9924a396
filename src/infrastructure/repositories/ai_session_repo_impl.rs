// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ai_session::{AiSession, SessionKind};
use crate::domain::repositories::ai_session_repository::AiSessionRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::ai_session as session_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// AI发现会话仓库实现
#[derive(Clone)]
pub struct AiSessionRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AiSessionRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<session_entity::Model> for AiSession {
    fn from(model: session_entity::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            kind: model
                .kind
                .parse()
                .unwrap_or(SessionKind::ProductDiscovery),
            model: model.model,
            query: model.query,
            items_found: model.items_found,
            insights: model.insights,
            completed: model.completed,
            started_at: model.started_at,
            completed_at: model.completed_at,
        }
    }
}

impl From<AiSession> for session_entity::ActiveModel {
    fn from(session: AiSession) -> Self {
        Self {
            id: Set(session.id),
            user_id: Set(session.user_id),
            kind: Set(session.kind.to_string()),
            model: Set(session.model),
            query: Set(session.query),
            items_found: Set(session.items_found),
            insights: Set(session.insights),
            completed: Set(session.completed),
            started_at: Set(session.started_at),
            completed_at: Set(session.completed_at),
        }
    }
}

#[async_trait]
impl AiSessionRepository for AiSessionRepositoryImpl {
    async fn create(&self, session: &AiSession) -> Result<AiSession, RepositoryError> {
        let model: session_entity::ActiveModel = session.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(session.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AiSession>, RepositoryError> {
        let model = session_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update(&self, session: &AiSession) -> Result<AiSession, RepositoryError> {
        let model: session_entity::ActiveModel = session.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn find_recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<AiSession>, RepositoryError> {
        let models = session_entity::Entity::find()
            .filter(session_entity::Column::UserId.eq(user_id))
            .order_by_desc(session_entity::Column::StartedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
