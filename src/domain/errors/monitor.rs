// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::kind::ErrorKind;

/// 环形缓冲区容量上限
const ERROR_LOG_CAPACITY: usize = 50;

/// 已分类的错误记录
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub id: Uuid,
    pub kind: ErrorKind,
    /// 原始技术消息，仅用于日志与诊断
    pub message: String,
    /// 面向用户的固定文案
    pub user_message: &'static str,
    pub recoverable: bool,
    pub critical: bool,
    /// 发生位置或操作的描述，例如 "job_executor"
    pub context: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            user_message: kind.user_message(),
            recoverable: kind.recoverable(),
            critical: kind.critical(),
            context,
            occurred_at: Utc::now(),
        }
    }
}

/// 按种类的错误统计
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStats {
    pub total: usize,
    pub by_kind: HashMap<String, usize>,
    /// 最近一小时内的错误数量
    pub last_hour: usize,
    pub critical_present: bool,
}

/// 错误监视器
///
/// 持有最近错误的有界环形日志（最多50条），新错误到达时
/// 通过广播通道通知订阅者。实例级状态，不使用全局单例。
pub struct ErrorMonitor {
    log: Mutex<VecDeque<ClassifiedError>>,
    tx: broadcast::Sender<ClassifiedError>,
}

impl ErrorMonitor {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            log: Mutex::new(VecDeque::with_capacity(ERROR_LOG_CAPACITY)),
            tx,
        }
    }

    /// 记录一个已知种类的错误
    pub fn report(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        context: Option<String>,
    ) -> ClassifiedError {
        let error = ClassifiedError::new(kind, message, context);
        self.push(error.clone());
        error
    }

    /// 处理一个原始错误
    ///
    /// 已分类的错误原样透传（保留原分类），其余按消息子串分类。
    pub fn handle(&self, error: &anyhow::Error, context: Option<String>) -> ClassifiedError {
        if let Some(classified) = error.downcast_ref::<ClassifiedError>() {
            let mut passthrough = classified.clone();
            if passthrough.context.is_none() {
                passthrough.context = context;
            }
            self.push(passthrough.clone());
            return passthrough;
        }
        self.classify_and_report(error.to_string(), context)
    }

    /// 根据消息子串分类并记录
    pub fn classify_and_report(
        &self,
        message: impl Into<String>,
        context: Option<String>,
    ) -> ClassifiedError {
        let message = message.into();
        let kind = ErrorKind::classify(&message);
        self.report(kind, message, context)
    }

    fn push(&self, error: ClassifiedError) {
        {
            let mut log = self.log.lock();
            if log.len() == ERROR_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(error.clone());
        }
        if error.critical {
            tracing::error!(kind = %error.kind, context = ?error.context, "critical error: {}", error.message);
        } else {
            tracing::warn!(kind = %error.kind, context = ?error.context, "error: {}", error.message);
        }
        metrics::counter!("errors_classified_total", "kind" => error.kind.to_string()).increment(1);
        // 没有订阅者时发送失败是正常情况
        let _ = self.tx.send(error);
    }

    /// 订阅错误事件流
    pub fn subscribe(&self) -> broadcast::Receiver<ClassifiedError> {
        self.tx.subscribe()
    }

    /// 当前日志快照，按发生顺序
    pub fn recent(&self) -> Vec<ClassifiedError> {
        self.log.lock().iter().cloned().collect()
    }

    /// 清空错误日志
    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// 聚合统计
    pub fn stats(&self) -> ErrorStats {
        let log = self.log.lock();
        let one_hour_ago = Utc::now() - Duration::hours(1);
        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut last_hour = 0;
        let mut critical_present = false;
        for error in log.iter() {
            *by_kind.entry(error.kind.to_string()).or_insert(0) += 1;
            if error.occurred_at >= one_hour_ago {
                last_hour += 1;
            }
            if error.critical {
                critical_present = true;
            }
        }
        ErrorStats {
            total: log.len(),
            by_kind,
            last_hour,
            critical_present,
        }
    }
}

impl Default for ErrorMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded_at_capacity() {
        let monitor = ErrorMonitor::new();
        for i in 0..60 {
            monitor.report(ErrorKind::Network, format!("error {}", i), None);
        }
        let recent = monitor.recent();
        assert_eq!(recent.len(), ERROR_LOG_CAPACITY);
        // 最旧的10条被淘汰
        assert_eq!(recent[0].message, "error 10");
        assert_eq!(recent.last().map(|e| e.message.as_str()), Some("error 59"));
    }

    #[test]
    fn test_stats_count_by_kind() {
        let monitor = ErrorMonitor::new();
        monitor.report(ErrorKind::Network, "net a", None);
        monitor.report(ErrorKind::Network, "net b", None);
        monitor.report(ErrorKind::Database, "db", None);
        let stats = monitor.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_kind.get("network"), Some(&2));
        assert_eq!(stats.by_kind.get("database"), Some(&1));
        assert_eq!(stats.last_hour, 3);
        assert!(stats.critical_present);
    }

    #[test]
    fn test_clear_empties_log() {
        let monitor = ErrorMonitor::new();
        monitor.report(ErrorKind::Timeout, "slow", None);
        monitor.clear();
        assert!(monitor.recent().is_empty());
        assert_eq!(monitor.stats().total, 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let monitor = ErrorMonitor::new();
        let mut rx = monitor.subscribe();
        monitor.classify_and_report("connection refused", Some("scheduler".into()));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ErrorKind::Network);
        assert_eq!(event.context.as_deref(), Some("scheduler"));
    }

    #[test]
    fn test_handle_passes_through_already_classified() {
        let monitor = ErrorMonitor::new();
        let original = ClassifiedError::new(ErrorKind::RateLimit, "slow down", None);
        let wrapped = anyhow::Error::new(original.clone());
        let handled = monitor.handle(&wrapped, Some("executor".into()));
        // 保留原分类，不重新按子串匹配
        assert_eq!(handled.kind, ErrorKind::RateLimit);
        assert_eq!(handled.id, original.id);
        assert_eq!(handled.context.as_deref(), Some("executor"));
    }

    #[test]
    fn test_classify_and_report_uses_substring_rules() {
        let monitor = ErrorMonitor::new();
        let error = monitor.classify_and_report("request timed out after 60s", None);
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert!(error.recoverable);
    }
}
