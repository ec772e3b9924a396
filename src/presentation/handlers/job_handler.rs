// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::job_request::{
    CreateJobRequestDto, FromTemplateRequestDto, JobQueryRequestDto, TestRunRequestDto,
    UpdateJobRequestDto,
};
use crate::application::dto::job_response::{
    JobListResponseDto, JobResponseDto, JobResultDto, TestRunResponseDto,
};
use crate::domain::errors::{ClassifiedError, ErrorKind};
use crate::domain::models::job::Job;
use crate::domain::models::template::{find_template, JobTemplate, BUILTIN_TEMPLATES};
use crate::domain::repositories::job_repository::{JobQueryParams, JobRepository, RepositoryError};
use crate::domain::repositories::result_repository::ResultRepository;
use crate::executor::job_executor::JobExecutor;
use crate::export::{results_to_csv, results_to_json, ExportFormat};
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use crate::utils::validators::validate_scrape_url;
use axum::extract::{Extension, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 加载任务并校验归属
///
/// 跨用户访问视为任务不存在，不泄露他人任务的存在性。
async fn fetch_owned_job<R: JobRepository>(
    jobs: &R,
    job_id: Uuid,
    user_id: Uuid,
) -> Result<Job, AppError> {
    let job = jobs
        .find_by_id(job_id)
        .await?
        .ok_or_else(|| ClassifiedError::new(ErrorKind::JobNotFound, "Job not found", None))?;
    if job.user_id != user_id {
        return Err(ClassifiedError::new(ErrorKind::JobNotFound, "Job not found", None).into());
    }
    Ok(job)
}

/// 创建任务
pub async fn create_job<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateJobRequestDto>,
) -> Result<(StatusCode, Json<JobResponseDto>), AppError> {
    request.validate()?;
    validate_scrape_url(&request.url)
        .map_err(|e| ClassifiedError::new(ErrorKind::InvalidUrl, e.to_string(), None))?;

    let mut job = Job::new(user.user_id, request.name, request.url, request.scrape_type);
    job.ai_prompt = request.ai_prompt;
    job.use_vision = request.use_vision;
    job.ai_model = request.ai_model;
    job.schedule_enabled = request.schedule_enabled;
    job.schedule = request.schedule;
    if let Some(config) = request.config {
        job.config = config;
    }
    if job.schedule_enabled {
        job.next_run_at = job
            .schedule
            .as_ref()
            .and_then(|s| s.next_run_after(Utc::now()))
            .map(Into::into);
    }

    let created = jobs.create(&job).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// 查询任务列表
///
/// 过滤条件放在请求体里（列表型过滤字段无法可靠地走查询串）。
pub async fn query_jobs<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<JobQueryRequestDto>,
) -> Result<Json<JobListResponseDto>, AppError> {
    request.validate()?;

    let limit = request.limit.unwrap_or(100);
    let offset = request.offset.unwrap_or(0);
    let params = JobQueryParams {
        user_id: user.user_id,
        job_ids: request.job_ids,
        statuses: request.statuses,
        scrape_types: request.scrape_types,
        created_after: request.created_after,
        created_before: request.created_before,
        limit,
        offset,
    };
    let (found, total) = jobs.query_jobs(params).await?;
    let has_more = (offset as u64 + found.len() as u64) < total;

    Ok(Json(JobListResponseDto {
        jobs: found.into_iter().map(Into::into).collect(),
        total,
        has_more,
    }))
}

/// 任务列表（无过滤）
pub async fn list_jobs<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<JobListResponseDto>, AppError> {
    let params = JobQueryParams {
        user_id: user.user_id,
        limit: 100,
        offset: 0,
        ..Default::default()
    };
    let (found, total) = jobs.query_jobs(params).await?;
    let has_more = (found.len() as u64) < total;

    Ok(Json(JobListResponseDto {
        jobs: found.into_iter().map(Into::into).collect(),
        total,
        has_more,
    }))
}

/// 获取单个任务
pub async fn get_job<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponseDto>, AppError> {
    let job = fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    Ok(Json(job.into()))
}

/// 更新任务
///
/// 部分更新：缺失字段保持原值。调度配置变化时重算下次执行时间。
pub async fn update_job<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
    Json(request): Json<UpdateJobRequestDto>,
) -> Result<Json<JobResponseDto>, AppError> {
    request.validate()?;

    let mut job = fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;

    if let Some(name) = request.name {
        job.name = name;
    }
    if let Some(url) = request.url {
        validate_scrape_url(&url)
            .map_err(|e| ClassifiedError::new(ErrorKind::InvalidUrl, e.to_string(), None))?;
        job.url = url;
    }
    if let Some(scrape_type) = request.scrape_type {
        job.scrape_type = scrape_type;
    }
    if let Some(prompt) = request.ai_prompt {
        job.ai_prompt = Some(prompt);
    }
    if let Some(use_vision) = request.use_vision {
        job.use_vision = use_vision;
    }
    if let Some(model) = request.ai_model {
        job.ai_model = Some(model);
    }
    if let Some(config) = request.config {
        job.config = config;
    }

    let schedule_changed = request.schedule_enabled.is_some() || request.schedule.is_some();
    if let Some(enabled) = request.schedule_enabled {
        job.schedule_enabled = enabled;
    }
    if let Some(schedule) = request.schedule {
        job.schedule = Some(schedule);
    }
    if schedule_changed {
        job.next_run_at = if job.schedule_enabled {
            job.schedule
                .as_ref()
                .and_then(|s| s.next_run_after(Utc::now()))
                .map(Into::into)
        } else {
            None
        };
    }
    job.updated_at = Utc::now().into();

    let updated = jobs.update(&job).await?;
    Ok(Json(updated.into()))
}

/// 删除任务
///
/// 级联删除该任务的全部执行结果。
pub async fn delete_job<R: JobRepository, S: ResultRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(results): Extension<Arc<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    results.delete_by_job_id(job_id).await?;
    jobs.delete(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 立即执行任务
pub async fn execute_job<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(executor): Extension<Arc<JobExecutor>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResultDto>, AppError> {
    fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    let result = executor.execute(job_id, &user.account_email).await?;
    Ok(Json(result.into()))
}

/// 取消执行中的任务
pub async fn cancel_job<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(executor): Extension<Arc<JobExecutor>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    let cancelled = executor.cancel(job_id);
    Ok(Json(json!({ "cancelled": cancelled })))
}

/// 试运行
///
/// 只走抓取路径，不创建任务、不写库。
pub async fn test_run(
    Extension(executor): Extension<Arc<JobExecutor>>,
    Json(request): Json<TestRunRequestDto>,
) -> Result<Json<TestRunResponseDto>, AppError> {
    request.validate()?;
    let outcome = executor
        .test_run(
            &request.url,
            request.scrape_type,
            request.ai_prompt,
            request.use_vision,
        )
        .await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<u64>,
}

/// 结果列表，最新在前
pub async fn list_results<R: JobRepository, S: ResultRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(results): Extension<Arc<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<JobResultDto>>, AppError> {
    fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    let limit = query.limit.unwrap_or(100).min(1000);
    let found = results.find_by_job_id(job_id, limit).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// 任务最近一条抓取结果
///
/// 尚无任何结果时返回404。
pub async fn latest_result<R: JobRepository, S: ResultRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(results): Extension<Arc<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResultDto>, AppError> {
    fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;
    let latest = results
        .find_latest(job_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(latest.into()))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub limit: Option<u64>,
}

/// 导出任务结果
///
/// format=csv导出CSV（固定列+按键排序的数据列），
/// format=json导出带任务元信息的JSON信封。
pub async fn export_results<R: JobRepository, S: ResultRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(results): Extension<Arc<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let job = fetch_owned_job(jobs.as_ref(), job_id, user.user_id).await?;

    let format = match query.format.as_deref() {
        None => ExportFormat::Json,
        Some(s) => ExportFormat::from_str_opt(s).ok_or_else(|| {
            ClassifiedError::new(
                ErrorKind::Validation,
                format!("unsupported export format: {s}"),
                None,
            )
        })?,
    };

    let limit = query.limit.unwrap_or(1000).min(10_000);
    let found = results.find_by_job_id(job_id, limit).await?;

    let (content_type, body) = match format {
        ExportFormat::Csv => (format.content_type(), results_to_csv(&found)),
        ExportFormat::Json => {
            let envelope = results_to_json(&job, &found);
            (format.content_type(), envelope.to_string())
        }
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

/// 内置模板列表
pub async fn list_templates() -> Json<&'static [JobTemplate]> {
    Json(BUILTIN_TEMPLATES)
}

/// 从模板创建任务
pub async fn create_from_template<R: JobRepository>(
    Extension(jobs): Extension<Arc<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<FromTemplateRequestDto>,
) -> Result<(StatusCode, Json<JobResponseDto>), AppError> {
    request.validate()?;
    validate_scrape_url(&request.url)
        .map_err(|e| ClassifiedError::new(ErrorKind::InvalidUrl, e.to_string(), None))?;

    let template = find_template(&request.template_id).ok_or_else(|| {
        ClassifiedError::new(
            ErrorKind::Validation,
            format!("unknown template: {}", request.template_id),
            None,
        )
    })?;

    let job = Job::from_template(template, user.user_id, request.url, request.overrides);
    let created = jobs.create(&job).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}
