// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::website::Website;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::website_repository::WebsiteRepository;
use crate::infrastructure::database::entities::website as website_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 站点仓库实现
#[derive(Clone)]
pub struct WebsiteRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl WebsiteRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<website_entity::Model> for Website {
    fn from(model: website_entity::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            domain: model.domain,
            category: model.category,
            rate_limit_rpm: model.rate_limit_rpm,
            validation_status: model.validation_status.parse().unwrap_or_default(),
            ai_confidence: model.ai_confidence,
            created_at: model.created_at,
        }
    }
}

impl From<Website> for website_entity::ActiveModel {
    fn from(website: Website) -> Self {
        Self {
            id: Set(website.id),
            user_id: Set(website.user_id),
            domain: Set(website.domain),
            category: Set(website.category),
            rate_limit_rpm: Set(website.rate_limit_rpm),
            validation_status: Set(website.validation_status.to_string()),
            ai_confidence: Set(website.ai_confidence),
            created_at: Set(website.created_at),
        }
    }
}

#[async_trait]
impl WebsiteRepository for WebsiteRepositoryImpl {
    async fn create(&self, website: &Website) -> Result<Website, RepositoryError> {
        let model: website_entity::ActiveModel = website.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(website.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Website>, RepositoryError> {
        let model = website_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Website>, RepositoryError> {
        let models = website_entity::Entity::find()
            .filter(website_entity::Column::UserId.eq(user_id))
            .order_by_asc(website_entity::Column::Domain)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, website: &Website) -> Result<Website, RepositoryError> {
        let model: website_entity::ActiveModel = website.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = website_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn exists_by_domain(
        &self,
        user_id: Uuid,
        domain: &str,
    ) -> Result<bool, RepositoryError> {
        let count = website_entity::Entity::find()
            .filter(website_entity::Column::UserId.eq(user_id))
            .filter(website_entity::Column::Domain.eq(domain))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}
