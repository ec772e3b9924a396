// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 来源网站目录条目
///
/// 用户或AI发现过程添加的可抓取站点，带分类、限速提示、
/// 验证状态；自动发现的条目附带AI置信度。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    /// 条目唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 站点域名
    pub domain: String,
    /// 分类
    pub category: Option<String>,
    /// 限速提示（每分钟请求数）
    pub rate_limit_rpm: Option<i32>,
    /// 验证状态
    pub validation_status: ValidationStatus,
    /// AI置信度，自动发现时填写
    pub ai_confidence: Option<f64>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 验证状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// 待验证
    #[default]
    Pending,
    /// 已验证有效
    Valid,
    /// 已验证无效
    Invalid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationStatus::Pending => write!(f, "pending"),
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Invalid => write!(f, "invalid"),
        }
    }
}

impl FromStr for ValidationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ValidationStatus::Pending),
            "valid" => Ok(ValidationStatus::Valid),
            "invalid" => Ok(ValidationStatus::Invalid),
            _ => Err(()),
        }
    }
}

impl Website {
    /// 创建一个用户手工添加的站点
    pub fn manual(user_id: Uuid, domain: String, category: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            domain,
            category,
            rate_limit_rpm: None,
            validation_status: ValidationStatus::Pending,
            ai_confidence: None,
            created_at: Utc::now().into(),
        }
    }

    /// 创建一个AI发现的站点
    pub fn discovered(
        user_id: Uuid,
        domain: String,
        category: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            domain,
            category,
            rate_limit_rpm: None,
            validation_status: ValidationStatus::Pending,
            ai_confidence: Some(confidence),
            created_at: Utc::now().into(),
        }
    }
}
