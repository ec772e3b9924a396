// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::{Channel, NotificationRecord, NotificationSettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::job_repository::RepositoryError;

/// 通知仓库特质
///
/// 覆盖每用户的通知偏好和已发送通知的日志。
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 读取用户的通知偏好，未设置时返回 `None`
    async fn get_settings(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationSettings>, RepositoryError>;
    /// 写入或覆盖用户的通知偏好
    async fn upsert_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, RepositoryError>;
    /// 记录一次通知投递
    async fn record(
        &self,
        record: &NotificationRecord,
    ) -> Result<NotificationRecord, RepositoryError>;
    /// 用户在某渠道自某时刻起的投递次数
    ///
    /// 用于小时与日频率上限检查。
    async fn count_since(
        &self,
        user_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
    /// 按用户列出最近通知
    async fn find_recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<NotificationRecord>, RepositoryError>;
}
