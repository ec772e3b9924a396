// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::schedule::ScheduleConfig;

/// 抓取任务实体
///
/// 表示用户定义的一个AI抓取任务：目标URL加AI指令，
/// 可选定时调度。任务具有状态机、AI配置和自由配置等属性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属用户ID，用于权限隔离
    pub user_id: Uuid,
    /// 显示名称
    pub name: String,
    /// 目标URL，任务要抓取的具体网址
    pub url: String,
    /// 任务状态，跟踪任务在其生命周期中的当前阶段
    pub status: JobStatus,
    /// 抓取类型，决定默认提示词模板
    pub scrape_type: ScrapeType,
    /// 自定义AI提示词；为空时使用类型默认模板
    pub ai_prompt: Option<String>,
    /// 是否使用视觉模型
    pub use_vision: bool,
    /// 模型标识符；为空时使用配置默认值
    pub ai_model: Option<String>,
    /// 是否启用调度
    pub schedule_enabled: bool,
    /// 调度配置
    pub schedule: Option<ScheduleConfig>,
    /// 下次计划执行时间
    pub next_run_at: Option<DateTime<FixedOffset>>,
    /// 任务配置，已知形态或不透明选择器映射
    pub config: JobConfig,
    /// 最后一次执行时间
    pub last_run_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 抓取类型枚举
///
/// 每种类型对应一个默认提示词模板和不同的结果解读方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeType {
    /// 通用抓取，提取页面的主要结构化信息
    #[default]
    General,
    /// 产品抓取，提取产品名称、价格、库存等字段
    Product,
    /// 价格抓取，只关注价格和货币
    Price,
    /// 内容抓取，提取正文文本
    Content,
}

impl fmt::Display for ScrapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeType::General => write!(f, "general"),
            ScrapeType::Product => write!(f, "product"),
            ScrapeType::Price => write!(f, "price"),
            ScrapeType::Content => write!(f, "content"),
        }
    }
}

impl FromStr for ScrapeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(ScrapeType::General),
            "product" => Ok(ScrapeType::Product),
            "price" => Ok(ScrapeType::Price),
            "content" => Ok(ScrapeType::Content),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed
/// Paused 是来自任何非终止状态的手动覆盖；
/// 已结束（Completed/Failed）的任务可以被再次认领执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 待执行，任务已创建但尚未开始
    #[default]
    Pending,
    /// 执行中，任务已被认领并正在运行
    Running,
    /// 已完成，最近一次执行成功
    Completed,
    /// 已失败，最近一次执行失败
    Failed,
    /// 已暂停，用户手动暂停，调度器和执行器均跳过
    Paused,
}

impl JobStatus {
    /// 是否可以被认领执行
    pub fn claimable(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Completed | JobStatus::Failed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Paused => write!(f, "paused"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "paused" => Ok(JobStatus::Paused),
            _ => Err(()),
        }
    }
}

/// 任务配置
///
/// 已知形态建模为带标签的变体；用户自定义的选择器映射等
/// 无法预知的形态保留为不透明JSON。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JobConfig {
    /// 已知的类型化配置
    Known(KnownConfig),
    /// 不透明JSON，用户自定义配置原样保留
    Opaque(serde_json::Value),
}

/// 已知的任务配置形态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnownConfig {
    /// 价格监控配置
    Price {
        /// 期望货币代码
        currency: String,
        /// 是否跟踪库存
        #[serde(default)]
        track_stock: bool,
    },
    /// CSS选择器映射配置
    Selectors {
        /// 字段名到选择器的映射
        selectors: BTreeMap<String, String>,
    },
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig::Opaque(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合业务规则时发生
    #[error("Invalid state transition from {0}")]
    InvalidStateTransition(JobStatus),

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Job {
    /// 创建一个新的任务
    ///
    /// # 参数
    ///
    /// * `user_id` - 所属用户ID
    /// * `name` - 显示名称
    /// * `url` - 目标URL
    /// * `scrape_type` - 抓取类型
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例
    pub fn new(user_id: Uuid, name: String, url: String, scrape_type: ScrapeType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            url,
            status: JobStatus::Pending,
            scrape_type,
            ai_prompt: None,
            use_vision: false,
            ai_model: None,
            schedule_enabled: false,
            schedule: None,
            next_run_at: None,
            config: JobConfig::default(),
            last_run_at: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 启动任务
    ///
    /// 将任务状态变更为Running并记录last_run_at。
    /// 只有可认领状态（Pending/Completed/Failed）允许启动。
    pub fn start(mut self) -> Result<Self, DomainError> {
        if !self.status.claimable() {
            return Err(DomainError::InvalidStateTransition(self.status));
        }
        self.status = JobStatus::Running;
        self.last_run_at = Some(Utc::now().into());
        self.updated_at = Utc::now().into();
        Ok(self)
    }

    /// 完成任务
    pub fn complete(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running => {
                self.status = JobStatus::Completed;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition(self.status)),
        }
    }

    /// 标记任务失败
    pub fn fail(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running => {
                self.status = JobStatus::Failed;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition(self.status)),
        }
    }

    /// 暂停任务
    ///
    /// 来自任何非终止状态的手动覆盖
    pub fn pause(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Running => {
                self.status = JobStatus::Paused;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition(self.status)),
        }
    }

    /// 恢复已暂停的任务
    pub fn resume(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Paused => {
                self.status = JobStatus::Pending;
                self.updated_at = Utc::now().into();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition(self.status)),
        }
    }
}
