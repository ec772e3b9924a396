// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// 已认领，开始执行
    Started,
    /// 正在调用AI
    Scraping,
    /// 正在保存结果
    Persisting,
    /// 执行成功结束
    Completed,
    /// 执行失败结束
    Failed,
    /// 被用户取消
    Cancelled,
}

/// 任务执行事件
///
/// 发布到 `job:{job_id}` 主题，同时镜像到 `jobs` 总主题。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub job_id: Uuid,
    /// 本次执行的结果ID，结果产生前为空
    pub execution_id: Option<Uuid>,
    pub phase: ExecutionPhase,
    /// 失败或取消时的说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    pub fn new(job_id: Uuid, phase: ExecutionPhase) -> Self {
        Self {
            job_id,
            execution_id: None,
            phase,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_execution(mut self, execution_id: Uuid) -> Self {
        self.execution_id = Some(execution_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 事件的单任务主题
    pub fn topic(&self) -> String {
        job_topic(self.job_id)
    }
}

/// 任务执行进度事件
///
/// 发布到 `progress:{job_id}` 主题，比执行事件更细粒度，
/// 用于前端进度条等轻量展示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: Uuid,
    /// 当前步骤描述
    pub stage: String,
    /// 完成百分比（0-100），未知时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(job_id: Uuid, stage: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            job_id,
            stage: stage.into(),
            percent,
            timestamp: Utc::now(),
        }
    }

    pub fn topic(&self) -> String {
        progress_topic(self.job_id)
    }
}

/// 单任务事件主题
pub fn job_topic(job_id: Uuid) -> String {
    format!("job:{}", job_id)
}

/// 单任务进度主题
pub fn progress_topic(job_id: Uuid) -> String {
    format!("progress:{}", job_id)
}

/// 全部任务事件的总主题
pub const ALL_JOBS_TOPIC: &str = "jobs";
