// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// AI发现会话实体
///
/// 一次AI发现调用（产品或来源发现）的审计记录，
/// 记录使用的模型、查询、找到的条目数和洞察数据。
/// 会话通过一次终止更新完成，完成后不再变更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSession {
    /// 会话唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 会话类型
    pub kind: SessionKind,
    /// 使用的模型
    pub model: String,
    /// 发现查询
    pub query: String,
    /// 找到的条目数
    pub items_found: i32,
    /// 自由形式的洞察数据
    pub insights: Option<serde_json::Value>,
    /// 是否已完成
    pub completed: bool,
    /// 开始时间
    pub started_at: DateTime<FixedOffset>,
    /// 完成时间
    pub completed_at: Option<DateTime<FixedOffset>>,
}

/// 会话类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// 产品发现
    ProductDiscovery,
    /// 来源发现
    SourceDiscovery,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionKind::ProductDiscovery => write!(f, "product_discovery"),
            SessionKind::SourceDiscovery => write!(f, "source_discovery"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product_discovery" => Ok(SessionKind::ProductDiscovery),
            "source_discovery" => Ok(SessionKind::SourceDiscovery),
            _ => Err(()),
        }
    }
}

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 会话已完成，不允许再次完成
    #[error("Session already completed")]
    AlreadyCompleted,
}

impl AiSession {
    /// 开启一个新的发现会话
    pub fn open(user_id: Uuid, kind: SessionKind, model: String, query: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            model,
            query,
            items_found: 0,
            insights: None,
            completed: false,
            started_at: Utc::now().into(),
            completed_at: None,
        }
    }

    /// 完成会话
    ///
    /// 恰好完成一次；重复完成返回错误。
    pub fn complete(
        mut self,
        items_found: i32,
        insights: Option<serde_json::Value>,
    ) -> Result<Self, SessionError> {
        if self.completed {
            return Err(SessionError::AlreadyCompleted);
        }
        self.items_found = items_found;
        self.insights = insights;
        self.completed = true;
        self.completed_at = Some(Utc::now().into());
        Ok(self)
    }
}
