// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::services::ai_client::TokenUsage;

/// 执行结果实体
///
/// 存储一次任务执行的结果数据。结果一经创建不可变更，
/// 新的执行产生新的结果记录而不是改写旧记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// 结果唯一标识符
    pub id: Uuid,
    /// 关联的任务ID
    pub job_id: Uuid,
    /// 结果状态
    pub status: ResultStatus,
    /// 提取到的数据，无模式的键值结构
    pub data: serde_json::Value,
    /// 错误信息，失败时的错误描述
    pub error_message: Option<String>,
    /// 执行耗时（毫秒）
    pub duration_ms: i64,
    /// 令牌使用情况
    pub token_usage: TokenUsage,
    /// 抓取时间戳
    pub scraped_at: DateTime<FixedOffset>,
}

/// 结果状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// 成功，提取到了期望的数据（包括降级为文本包装的情况）
    #[default]
    Success,
    /// 部分成功，提取到了部分字段
    Partial,
    /// 失败，调用或提取失败
    Failed,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "success"),
            ResultStatus::Partial => write!(f, "partial"),
            ResultStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ResultStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ResultStatus::Success),
            "partial" => Ok(ResultStatus::Partial),
            "failed" => Ok(ResultStatus::Failed),
            _ => Err(()),
        }
    }
}

impl JobResult {
    /// 创建一个成功结果
    pub fn success(
        job_id: Uuid,
        data: serde_json::Value,
        duration_ms: i64,
        token_usage: TokenUsage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            status: ResultStatus::Success,
            data,
            error_message: None,
            duration_ms,
            token_usage,
            scraped_at: Utc::now().into(),
        }
    }

    /// 创建一个失败结果
    ///
    /// 数据字段为空对象；错误信息记录失败原因。
    pub fn failure(job_id: Uuid, error: String, duration_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            status: ResultStatus::Failed,
            data: serde_json::Value::Object(serde_json::Map::new()),
            error_message: Some(error),
            duration_ms,
            token_usage: TokenUsage::default(),
            scraped_at: Utc::now().into(),
        }
    }
}
