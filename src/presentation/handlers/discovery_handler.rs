// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::discovery_request::{DiscoveryRequestDto, DiscoveryResponseDto};
use crate::domain::services::discovery_service::DiscoveryService;
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use crate::domain::models::ai_session::AiSession;
use axum::extract::{Extension, Query};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// AI产品发现
///
/// 根据自然语言查询让AI推荐产品及其来源站点。
/// 总是开启并完成一个审计会话，即使AI调用失败。
pub async fn discover_products(
    Extension(discovery): Extension<Arc<DiscoveryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<DiscoveryRequestDto>,
) -> Result<Json<DiscoveryResponseDto>, AppError> {
    request.validate()?;
    let report = discovery
        .discover_products(user.user_id, &request.query)
        .await?;
    Ok(Json(report.into()))
}

/// AI来源站点发现
pub async fn discover_sources(
    Extension(discovery): Extension<Arc<DiscoveryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<DiscoveryRequestDto>,
) -> Result<Json<DiscoveryResponseDto>, AppError> {
    request.validate()?;
    let report = discovery
        .discover_sources(user.user_id, &request.query)
        .await?;
    Ok(Json(report.into()))
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    /// 最多返回条数
    pub limit: Option<u64>,
}

/// 最近的发现会话，按开始时间倒序
pub async fn list_sessions(
    Extension(discovery): Extension<Arc<DiscoveryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Vec<AiSession>>, AppError> {
    let limit = query.limit.unwrap_or(20).min(200);
    let sessions = discovery.recent_sessions(user.user_id, limit).await?;
    Ok(Json(sessions))
}
