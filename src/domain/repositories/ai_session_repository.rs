// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ai_session::AiSession;
use async_trait::async_trait;
use uuid::Uuid;

use super::job_repository::RepositoryError;

/// AI发现会话仓库特质
#[async_trait]
pub trait AiSessionRepository: Send + Sync {
    /// 开启新会话
    async fn create(&self, session: &AiSession) -> Result<AiSession, RepositoryError>;
    /// 根据ID查找会话
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AiSession>, RepositoryError>;
    /// 更新会话（完成时写入结果摘要）
    async fn update(&self, session: &AiSession) -> Result<AiSession, RepositoryError>;
    /// 按用户列出最近会话
    async fn find_recent(&self, user_id: Uuid, limit: u64)
        -> Result<Vec<AiSession>, RepositoryError>;
}
