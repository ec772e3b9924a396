// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::website::Website;
use async_trait::async_trait;
use uuid::Uuid;

use super::job_repository::RepositoryError;

/// 站点仓库特质
#[async_trait]
pub trait WebsiteRepository: Send + Sync {
    /// 创建站点
    async fn create(&self, website: &Website) -> Result<Website, RepositoryError>;
    /// 根据ID查找站点
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Website>, RepositoryError>;
    /// 按用户列出站点
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Website>, RepositoryError>;
    /// 更新站点
    async fn update(&self, website: &Website) -> Result<Website, RepositoryError>;
    /// 删除站点
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 检查用户是否已登记某域名
    async fn exists_by_domain(&self, user_id: Uuid, domain: &str)
        -> Result<bool, RepositoryError>;
}
