// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::job::{JobConfig, JobStatus, ScrapeType};
use crate::domain::models::schedule::ScheduleConfig;
use crate::domain::models::template::TemplateOverrides;

/// 创建任务请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateJobRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub scrape_type: ScrapeType,
    pub ai_prompt: Option<String>,
    #[serde(default)]
    pub use_vision: bool,
    pub ai_model: Option<String>,
    #[serde(default)]
    pub schedule_enabled: bool,
    pub schedule: Option<ScheduleConfig>,
    pub config: Option<JobConfig>,
}

/// 更新任务请求DTO
///
/// 所有字段可选，缺失的字段保持不变。状态只能通过
/// execute/cancel等动作端点改变，不在此处更新。
#[derive(Debug, Deserialize, Serialize, Validate, Default)]
pub struct UpdateJobRequestDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub scrape_type: Option<ScrapeType>,
    pub ai_prompt: Option<String>,
    pub use_vision: Option<bool>,
    pub ai_model: Option<String>,
    pub schedule_enabled: Option<bool>,
    pub schedule: Option<ScheduleConfig>,
    pub config: Option<JobConfig>,
}

/// 任务列表查询请求DTO
#[derive(Debug, Deserialize, Serialize, Validate, Default)]
pub struct JobQueryRequestDto {
    /// 任务ID列表（批量查询）
    pub job_ids: Option<Vec<Uuid>>,
    /// 任务状态过滤
    pub statuses: Option<Vec<JobStatus>>,
    /// 抓取类型过滤
    pub scrape_types: Option<Vec<ScrapeType>>,
    /// 创建时间范围过滤（开始时间）
    pub created_after: Option<DateTime<FixedOffset>>,
    /// 创建时间范围过滤（结束时间）
    pub created_before: Option<DateTime<FixedOffset>>,
    /// 分页大小
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    /// 分页偏移
    pub offset: Option<u32>,
}

/// 试运行请求DTO
///
/// 只走抓取路径，不创建任务、不写库。
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TestRunRequestDto {
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub scrape_type: ScrapeType,
    pub ai_prompt: Option<String>,
    #[serde(default)]
    pub use_vision: bool,
}

/// 从模板创建任务请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct FromTemplateRequestDto {
    /// 模板标识符
    #[validate(length(min = 1))]
    pub template_id: String,
    #[validate(url)]
    pub url: String,
    /// 覆盖项，缺失时照搬模板默认值
    #[serde(default)]
    pub overrides: TemplateOverrides,
}
