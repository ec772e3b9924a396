// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::notification::NotificationSettings;

/// 通知设置保存请求DTO
///
/// 保存为整行覆盖：缺失的可选字段会清空对应设置。
#[derive(Debug, Deserialize, Serialize, Validate, Default)]
pub struct NotificationSettingsRequestDto {
    #[serde(default)]
    pub email_enabled: bool,
    #[validate(email)]
    pub email_recipient: Option<String>,
    #[serde(default)]
    pub sms_enabled: bool,
    pub sms_recipient: Option<String>,
    #[serde(default)]
    pub webhook_enabled: bool,
    #[validate(url)]
    pub webhook_recipient: Option<String>,
    #[serde(default)]
    pub event_toggles: BTreeMap<String, bool>,
    #[validate(range(min = 0, max = 23))]
    pub quiet_hours_start: Option<u8>,
    #[validate(range(min = 0, max = 23))]
    pub quiet_hours_end: Option<u8>,
    #[validate(range(min = 1))]
    pub max_per_hour: Option<i32>,
    #[validate(range(min = 1))]
    pub max_per_day: Option<i32>,
}

impl NotificationSettingsRequestDto {
    /// 合成领域设置对象
    pub fn into_settings(self, user_id: Uuid) -> NotificationSettings {
        NotificationSettings {
            user_id,
            email_enabled: self.email_enabled,
            email_recipient: self.email_recipient,
            sms_enabled: self.sms_enabled,
            sms_recipient: self.sms_recipient,
            webhook_enabled: self.webhook_enabled,
            webhook_recipient: self.webhook_recipient,
            event_toggles: self.event_toggles,
            quiet_hours_start: self.quiet_hours_start,
            quiet_hours_end: self.quiet_hours_end,
            max_per_hour: self.max_per_hour,
            max_per_day: self.max_per_day,
            updated_at: Utc::now().into(),
        }
    }
}
