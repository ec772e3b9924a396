// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{PricePoint, Product};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::infrastructure::database::entities::price_history as price_entity;
use crate::infrastructure::database::entities::product as product_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 商品仓库实现
#[derive(Clone)]
pub struct ProductRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ProductRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<product_entity::Model> for Product {
    fn from(model: product_entity::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            url: model.url,
            sources: model
                .sources
                .and_then(|v| serde_json::from_value(v).ok()),
            created_at: model.created_at,
        }
    }
}

impl From<Product> for product_entity::ActiveModel {
    fn from(product: Product) -> Self {
        Self {
            id: Set(product.id),
            user_id: Set(product.user_id),
            name: Set(product.name),
            url: Set(product.url),
            sources: Set(product
                .sources
                .as_ref()
                .and_then(|s| serde_json::to_value(s).ok())),
            created_at: Set(product.created_at),
        }
    }
}

impl From<price_entity::Model> for PricePoint {
    fn from(model: price_entity::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            price: model.price,
            currency: model.currency,
            in_stock: model.in_stock,
            recorded_at: model.recorded_at,
        }
    }
}

impl From<PricePoint> for price_entity::ActiveModel {
    fn from(point: PricePoint) -> Self {
        Self {
            id: Set(point.id),
            product_id: Set(point.product_id),
            price: Set(point.price),
            currency: Set(point.currency),
            in_stock: Set(point.in_stock),
            recorded_at: Set(point.recorded_at),
        }
    }
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError> {
        let model: product_entity::ActiveModel = product.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(product.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let model = product_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Product>, RepositoryError> {
        let models = product_entity::Entity::find()
            .filter(product_entity::Column::UserId.eq(user_id))
            .order_by_desc(product_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let model: product_entity::ActiveModel = product.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        price_entity::Entity::delete_many()
            .filter(price_entity::Column::ProductId.eq(id))
            .exec(self.db.as_ref())
            .await?;
        let result = product_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn append_price_point(
        &self,
        point: &PricePoint,
    ) -> Result<PricePoint, RepositoryError> {
        let model: price_entity::ActiveModel = point.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(point.clone())
    }

    async fn price_history(
        &self,
        product_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PricePoint>, RepositoryError> {
        let mut query = price_entity::Entity::find()
            .filter(price_entity::Column::ProductId.eq(product_id));
        if let Some(since) = since {
            query = query.filter(price_entity::Column::RecordedAt.gte(since));
        }
        let models = query
            .order_by_asc(price_entity::Column::RecordedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
