// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::notification_request::NotificationSettingsRequestDto;
use crate::domain::models::notification::{NotificationRecord, NotificationSettings};
use crate::domain::repositories::notification_repository::NotificationRepository;
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use axum::extract::{Extension, Query};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// 获取通知设置
///
/// 尚未保存过设置的用户得到一份全渠道关闭的默认设置。
pub async fn get_settings<N: NotificationRepository>(
    Extension(repo): Extension<Arc<N>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<NotificationSettings>, AppError> {
    let settings = repo
        .get_settings(user.user_id)
        .await?
        .unwrap_or_else(|| NotificationSettings::disabled(user.user_id));
    Ok(Json(settings))
}

/// 保存通知设置
///
/// 整行覆盖式写入，不保留历史版本。
pub async fn save_settings<N: NotificationRepository>(
    Extension(repo): Extension<Arc<N>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<NotificationSettingsRequestDto>,
) -> Result<Json<NotificationSettings>, AppError> {
    request.validate()?;
    let settings = request.into_settings(user.user_id);
    let saved = repo.upsert_settings(&settings).await?;
    Ok(Json(saved))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// 最多返回条数
    pub limit: Option<u64>,
}

/// 最近的通知投递记录，按派发时间倒序
pub async fn recent_notifications<N: NotificationRepository>(
    Extension(repo): Extension<Arc<N>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    let limit = query.limit.unwrap_or(50).min(500);
    let records = repo.find_recent(user.user_id, limit).await?;
    Ok(Json(records))
}
