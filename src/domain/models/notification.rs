// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 通知渠道枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// 邮件
    Email,
    /// 短信
    Sms,
    /// Webhook回调
    Webhook,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
            Channel::Webhook => write!(f, "webhook"),
        }
    }
}

impl FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "webhook" => Ok(Channel::Webhook),
            _ => Err(()),
        }
    }
}

/// 通知事件类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// 任务执行完成
    JobCompleted,
    /// 任务执行失败
    JobFailed,
    /// 价格变动
    PriceChanged,
    /// 发现完成
    DiscoveryCompleted,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventType::JobCompleted => write!(f, "job.completed"),
            EventType::JobFailed => write!(f, "job.failed"),
            EventType::PriceChanged => write!(f, "price.changed"),
            EventType::DiscoveryCompleted => write!(f, "discovery.completed"),
        }
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job.completed" => Ok(EventType::JobCompleted),
            "job.failed" => Ok(EventType::JobFailed),
            "price.changed" => Ok(EventType::PriceChanged),
            "discovery.completed" => Ok(EventType::DiscoveryCompleted),
            _ => Err(()),
        }
    }
}

/// 用户通知设置
///
/// 每个用户一行：渠道开关与收件地址、按事件类型的开关、
/// 静默时段和频率上限。保存时整行覆盖，不保留历史。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// 所属用户ID
    pub user_id: Uuid,
    /// 邮件渠道开关
    pub email_enabled: bool,
    /// 邮件收件地址；为空时回退到账户邮箱
    pub email_recipient: Option<String>,
    /// 短信渠道开关
    pub sms_enabled: bool,
    /// 短信收件号码
    pub sms_recipient: Option<String>,
    /// Webhook渠道开关
    pub webhook_enabled: bool,
    /// Webhook回调URL
    pub webhook_recipient: Option<String>,
    /// 按事件类型的开关；缺失的事件类型默认开启
    pub event_toggles: BTreeMap<String, bool>,
    /// 静默时段开始小时（UTC，0-23）
    pub quiet_hours_start: Option<u8>,
    /// 静默时段结束小时（UTC，0-23）
    pub quiet_hours_end: Option<u8>,
    /// 每小时最大通知数
    pub max_per_hour: Option<i32>,
    /// 每天最大通知数
    pub max_per_day: Option<i32>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

impl NotificationSettings {
    /// 创建默认设置（所有渠道关闭）
    pub fn disabled(user_id: Uuid) -> Self {
        Self {
            user_id,
            email_enabled: false,
            email_recipient: None,
            sms_enabled: false,
            sms_recipient: None,
            webhook_enabled: false,
            webhook_recipient: None,
            event_toggles: BTreeMap::new(),
            quiet_hours_start: None,
            quiet_hours_end: None,
            max_per_hour: None,
            max_per_day: None,
            updated_at: Utc::now().into(),
        }
    }

    /// 事件类型是否开启
    pub fn event_enabled(&self, event: EventType) -> bool {
        *self.event_toggles.get(&event.to_string()).unwrap_or(&true)
    }

    /// 渠道是否开启
    pub fn channel_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email_enabled,
            Channel::Sms => self.sms_enabled,
            Channel::Webhook => self.webhook_enabled,
        }
    }

    /// 解析渠道收件人
    ///
    /// 邮件渠道在未配置收件地址时回退到账户邮箱；
    /// 其余渠道未配置即无收件人。
    pub fn recipient_for(&self, channel: Channel, account_email: &str) -> Option<String> {
        match channel {
            Channel::Email => self
                .email_recipient
                .clone()
                .filter(|r| !r.is_empty())
                .or_else(|| {
                    if account_email.is_empty() {
                        None
                    } else {
                        Some(account_email.to_string())
                    }
                }),
            Channel::Sms => self.sms_recipient.clone().filter(|r| !r.is_empty()),
            Channel::Webhook => self.webhook_recipient.clone().filter(|r| !r.is_empty()),
        }
    }

    /// 当前时间是否处于静默时段
    ///
    /// 时段含起始小时、不含结束小时，支持跨午夜的窗口。
    pub fn in_quiet_hours(&self, now: DateTime<Utc>) -> bool {
        let (Some(start), Some(end)) = (self.quiet_hours_start, self.quiet_hours_end) else {
            return false;
        };
        if start == end {
            return false;
        }
        let hour = now.hour() as u8;
        if start < end {
            hour >= start && hour < end
        } else {
            // 跨午夜
            hour >= start || hour < end
        }
    }
}

/// 通知消息负载
///
/// 发送给远程投递函数的结构化消息体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// 标题
    pub title: String,
    /// 正文
    pub body: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 关联任务ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    /// 关联执行ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,
    /// 附加元数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// 远程投递函数的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// 是否成功
    pub success: bool,
    /// 说明信息
    #[serde(default)]
    pub message: String,
    /// 已发送数量
    #[serde(default)]
    pub sent: u32,
    /// 排队数量
    #[serde(default)]
    pub queued: Option<u32>,
    /// 详细信息
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// 单渠道投递结果
///
/// 渠道之间相互独立，没有部分失败回滚；顺序不重要。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// 渠道
    pub channel: Channel,
    /// 是否成功投递
    pub delivered: bool,
    /// 解析到的收件人
    pub recipient: Option<String>,
    /// 未投递原因（未配置收件人、静默时段、超出限额或投递失败）
    pub reason: Option<String>,
}

impl DispatchOutcome {
    /// 未解析到收件人的非致命结果
    pub fn unresolved(channel: Channel) -> Self {
        Self {
            channel,
            delivered: false,
            recipient: None,
            reason: Some("no recipient configured".to_string()),
        }
    }

    /// 被抑制（静默时段或限额）的结果
    pub fn suppressed(channel: Channel, recipient: String, reason: &str) -> Self {
        Self {
            channel,
            delivered: false,
            recipient: Some(recipient),
            reason: Some(reason.to_string()),
        }
    }
}

/// 通知投递日志条目
///
/// 持久化的单次投递记录，驱动每小时/每天的限额计数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 事件类型
    pub event_type: EventType,
    /// 渠道
    pub channel: Channel,
    /// 收件人
    pub recipient: String,
    /// 是否投递成功
    pub delivered: bool,
    /// 失败时的错误描述
    pub error_message: Option<String>,
    /// 关联任务ID
    pub job_id: Option<Uuid>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl NotificationRecord {
    /// 创建一条投递记录
    pub fn new(
        user_id: Uuid,
        event_type: EventType,
        channel: Channel,
        recipient: String,
        delivered: bool,
        error_message: Option<String>,
        job_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_type,
            channel,
            recipient,
            delivered,
            error_message,
            job_id,
            created_at: Utc::now().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> NotificationSettings {
        NotificationSettings::disabled(Uuid::new_v4())
    }

    #[test]
    fn test_email_recipient_falls_back_to_account_email() {
        let mut s = settings();
        s.email_enabled = true;
        assert_eq!(
            s.recipient_for(Channel::Email, "user@example.com"),
            Some("user@example.com".to_string())
        );

        s.email_recipient = Some("other@example.com".to_string());
        assert_eq!(
            s.recipient_for(Channel::Email, "user@example.com"),
            Some("other@example.com".to_string())
        );
    }

    #[test]
    fn test_sms_without_recipient_is_unresolved() {
        let s = settings();
        assert_eq!(s.recipient_for(Channel::Sms, "user@example.com"), None);
    }

    #[test]
    fn test_quiet_hours_plain_window() {
        let mut s = settings();
        s.quiet_hours_start = Some(22);
        s.quiet_hours_end = Some(23);

        let inside = Utc.with_ymd_and_hms(2025, 5, 1, 22, 30, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 5, 1, 21, 30, 0).unwrap();
        assert!(s.in_quiet_hours(inside));
        assert!(!s.in_quiet_hours(outside));
    }

    #[test]
    fn test_quiet_hours_wraps_midnight() {
        let mut s = settings();
        s.quiet_hours_start = Some(22);
        s.quiet_hours_end = Some(6);

        let late = Utc.with_ymd_and_hms(2025, 5, 1, 23, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 5, 1, 3, 0, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert!(s.in_quiet_hours(late));
        assert!(s.in_quiet_hours(early));
        assert!(!s.in_quiet_hours(midday));
    }

    #[test]
    fn test_event_toggle_defaults_on() {
        let mut s = settings();
        assert!(s.event_enabled(EventType::JobCompleted));

        s.event_toggles
            .insert(EventType::JobCompleted.to_string(), false);
        assert!(!s.event_enabled(EventType::JobCompleted));
    }
}
