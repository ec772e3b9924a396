// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 应用错误类型枚举
///
/// 封闭的错误种类集合，每种对应固定的用户可见文案和
/// 固定的可恢复标志。分类在消息子串匹配中是确定性的。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 网络错误
    Network,
    /// AI服务错误
    AiService,
    /// 数据库错误
    Database,
    /// 认证错误
    Authentication,
    /// 输入验证错误
    Validation,
    /// 权限错误
    Permission,
    /// 配置错误
    Configuration,
    /// 服务不可用
    ServiceUnavailable,
    /// 超时
    Timeout,
    /// 触发限流
    RateLimit,
    /// 配额耗尽
    QuotaExceeded,
    /// 数据完整性错误
    DataIntegrity,
    /// 任务不存在
    JobNotFound,
    /// URL无效
    InvalidUrl,
    /// 未知错误
    Unknown,
}

impl ErrorKind {
    /// 固定的用户可见文案
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "A network problem interrupted the operation. Please try again.",
            ErrorKind::AiService => "The AI service could not process the request right now.",
            ErrorKind::Database => "A storage problem occurred. Your data was not changed.",
            ErrorKind::Authentication => "Your session is not valid. Please sign in again.",
            ErrorKind::Validation => "Some of the provided values are not valid.",
            ErrorKind::Permission => "You do not have permission to perform this action.",
            ErrorKind::Configuration => "The application is not configured correctly.",
            ErrorKind::ServiceUnavailable => "The service is temporarily unavailable.",
            ErrorKind::Timeout => "The operation took too long and was aborted.",
            ErrorKind::RateLimit => "Too many requests. Please wait a moment and retry.",
            ErrorKind::QuotaExceeded => "The usage quota for this service has been exhausted.",
            ErrorKind::DataIntegrity => "The stored data is inconsistent and could not be used.",
            ErrorKind::JobNotFound => "The requested job does not exist.",
            ErrorKind::InvalidUrl => "The provided URL is not valid.",
            ErrorKind::Unknown => "An unexpected error occurred.",
        }
    }

    /// 固定的可恢复标志
    ///
    /// 可恢复的种类适合手动或显式选择的自动重试；
    /// 不可恢复的种类需要用户修正后再试。
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::RateLimit
                | ErrorKind::ServiceUnavailable
                | ErrorKind::QuotaExceeded
        )
    }

    /// 是否为关键错误
    ///
    /// 关键错误在UI侧触发阻塞性覆盖层而非瞬态提示。
    pub fn critical(&self) -> bool {
        matches!(
            self,
            ErrorKind::Database
                | ErrorKind::AiService
                | ErrorKind::Authentication
                | ErrorKind::Configuration
        )
    }

    /// 根据原始消息子串分类
    ///
    /// 对相同输入消息，返回值是确定的。无法识别时返回Unknown。
    pub fn classify(message: &str) -> ErrorKind {
        let lower = message.to_lowercase();
        // 先匹配更具体的子串
        if lower.contains("rate limit") || lower.contains("too many requests") {
            ErrorKind::RateLimit
        } else if lower.contains("quota") {
            ErrorKind::QuotaExceeded
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ErrorKind::Timeout
        } else if lower.contains("unauthorized") || lower.contains("authentication") {
            ErrorKind::Authentication
        } else if lower.contains("permission") || lower.contains("forbidden") {
            ErrorKind::Permission
        } else if lower.contains("validation") || lower.contains("invalid input") {
            ErrorKind::Validation
        } else if lower.contains("invalid url") {
            ErrorKind::InvalidUrl
        } else if lower.contains("job not found") {
            ErrorKind::JobNotFound
        } else if lower.contains("database") || lower.contains("db error") {
            ErrorKind::Database
        } else if lower.contains("configuration") || lower.contains("config") {
            ErrorKind::Configuration
        } else if lower.contains("service unavailable") || lower.contains("unavailable") {
            ErrorKind::ServiceUnavailable
        } else if lower.contains("network") || lower.contains("connection") {
            ErrorKind::Network
        } else {
            ErrorKind::Unknown
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ErrorKind::Network => "network",
            ErrorKind::AiService => "ai_service",
            ErrorKind::Database => "database",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::Configuration => "configuration",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::DataIntegrity => "data_integrity",
            ErrorKind::JobNotFound => "job_not_found",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_deterministic() {
        for message in [
            "network unreachable",
            "request timed out",
            "unauthorized: bad token",
            "rate limit exceeded",
            "quota exhausted",
        ] {
            assert_eq!(ErrorKind::classify(message), ErrorKind::classify(message));
        }
    }

    #[test]
    fn test_classification_substrings() {
        assert_eq!(ErrorKind::classify("Network error"), ErrorKind::Network);
        assert_eq!(ErrorKind::classify("operation timeout"), ErrorKind::Timeout);
        assert_eq!(
            ErrorKind::classify("401 Unauthorized"),
            ErrorKind::Authentication
        );
        assert_eq!(
            ErrorKind::classify("permission denied"),
            ErrorKind::Permission
        );
        assert_eq!(
            ErrorKind::classify("validation failed for field"),
            ErrorKind::Validation
        );
        assert_eq!(
            ErrorKind::classify("rate limit hit, slow down"),
            ErrorKind::RateLimit
        );
        assert_eq!(
            ErrorKind::classify("monthly quota exceeded"),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(ErrorKind::classify("something odd"), ErrorKind::Unknown);
    }

    #[test]
    fn test_rate_limit_wins_over_network() {
        // 更具体的子串优先
        assert_eq!(
            ErrorKind::classify("network rate limit reached"),
            ErrorKind::RateLimit
        );
    }

    #[test]
    fn test_recoverability_flags() {
        assert!(ErrorKind::Network.recoverable());
        assert!(ErrorKind::Timeout.recoverable());
        assert!(ErrorKind::RateLimit.recoverable());
        assert!(ErrorKind::ServiceUnavailable.recoverable());
        assert!(!ErrorKind::Authentication.recoverable());
        assert!(!ErrorKind::Permission.recoverable());
        assert!(!ErrorKind::Validation.recoverable());
        assert!(!ErrorKind::Configuration.recoverable());
    }

    #[test]
    fn test_critical_flags() {
        assert!(ErrorKind::Database.critical());
        assert!(ErrorKind::AiService.critical());
        assert!(ErrorKind::Authentication.critical());
        assert!(ErrorKind::Configuration.critical());
        assert!(!ErrorKind::Network.critical());
    }
}
