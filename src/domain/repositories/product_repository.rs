// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{PricePoint, Product};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::job_repository::RepositoryError;

/// 商品仓库特质
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 创建商品
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError>;
    /// 根据ID查找商品
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepositoryError>;
    /// 按用户列出商品
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Product>, RepositoryError>;
    /// 更新商品
    async fn update(&self, product: &Product) -> Result<Product, RepositoryError>;
    /// 删除商品及其价格历史
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 追加价格点
    ///
    /// 价格历史只追加，已有记录永不修改。
    async fn append_price_point(&self, point: &PricePoint) -> Result<PricePoint, RepositoryError>;
    /// 商品在时间区间内的价格历史，按记录时间升序
    async fn price_history(
        &self,
        product_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PricePoint>, RepositoryError>;
}
