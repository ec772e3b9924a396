// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::analytics_service::{
    AnalyticsService, ExecutionSummary, JobOverview, PriceSummary,
};
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use axum::extract::{Extension, Path, Query};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// 任务总览统计
pub async fn job_overview(
    Extension(analytics): Extension<Arc<AnalyticsService>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<JobOverview>, AppError> {
    let overview = analytics.job_overview(user.user_id).await?;
    Ok(Json(overview))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// 统计窗口内最多纳入的执行记录数
    pub window: Option<u64>,
}

/// 单任务执行汇总
pub async fn execution_summary(
    Extension(analytics): Extension<Arc<AnalyticsService>>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ExecutionSummary>, AppError> {
    let window = query.window.unwrap_or(100).min(1000);
    let summary = analytics.execution_summary(job_id, window).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    /// 只统计该时刻之后的价格点
    pub since: Option<DateTime<Utc>>,
}

/// 产品价格汇总
pub async fn price_summary(
    Extension(analytics): Extension<Arc<AnalyticsService>>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceSummary>, AppError> {
    let summary = analytics.price_summary(product_id, query.since).await?;
    Ok(Json(summary))
}
