// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::notification::{
    Channel, DeliveryReceipt, DispatchOutcome, EventType, NotificationMessage, NotificationRecord,
};
use crate::domain::repositories::NotificationRepository;

/// 通知投递接口
///
/// 把单条消息投递到远程投递端点，实现位于基础设施层。
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    async fn deliver(
        &self,
        event: EventType,
        channel: Channel,
        recipient: &str,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt>;
}

/// 通知分发服务
///
/// 按用户偏好把事件分发到已启用的渠道。渠道之间相互独立，
/// 单渠道失败不影响其他渠道；静默时段和频率上限在投递前检查。
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    delivery: Arc<dyn NotificationDelivery>,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        delivery: Arc<dyn NotificationDelivery>,
    ) -> Self {
        Self {
            repository,
            delivery,
        }
    }

    /// 分发一个事件
    ///
    /// # 参数
    /// * `user_id` - 目标用户
    /// * `account_email` - 账户邮箱，邮件渠道的回退收件地址
    /// * `event` - 事件类型
    /// * `message` - 消息负载
    ///
    /// # 返回值
    /// 每个已启用渠道一条结果；未配置偏好或事件被关闭时返回空。
    pub async fn dispatch(
        &self,
        user_id: Uuid,
        account_email: &str,
        event: EventType,
        message: &NotificationMessage,
    ) -> Result<Vec<DispatchOutcome>> {
        let Some(settings) = self.repository.get_settings(user_id).await? else {
            tracing::debug!(%user_id, "no notification settings, skipping dispatch");
            return Ok(Vec::new());
        };
        if !settings.event_enabled(event) {
            tracing::debug!(%user_id, event = %event, "event type disabled, skipping dispatch");
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut outcomes = Vec::new();

        for channel in [Channel::Email, Channel::Sms, Channel::Webhook] {
            if !settings.channel_enabled(channel) {
                continue;
            }

            let Some(recipient) = settings.recipient_for(channel, account_email) else {
                tracing::debug!(%user_id, %channel, "no recipient resolved");
                outcomes.push(DispatchOutcome::unresolved(channel));
                continue;
            };

            if settings.in_quiet_hours(now) {
                outcomes.push(DispatchOutcome::suppressed(channel, recipient, "quiet hours"));
                continue;
            }

            if let Some(max) = settings.max_per_hour {
                let sent = self
                    .repository
                    .count_since(user_id, channel, now - Duration::hours(1))
                    .await?;
                if sent >= max as u64 {
                    outcomes.push(DispatchOutcome::suppressed(
                        channel,
                        recipient,
                        "hourly limit reached",
                    ));
                    continue;
                }
            }
            if let Some(max) = settings.max_per_day {
                let sent = self
                    .repository
                    .count_since(user_id, channel, now - Duration::days(1))
                    .await?;
                if sent >= max as u64 {
                    outcomes.push(DispatchOutcome::suppressed(
                        channel,
                        recipient,
                        "daily limit reached",
                    ));
                    continue;
                }
            }

            let (delivered, error) = match self
                .delivery
                .deliver(event, channel, &recipient, message)
                .await
            {
                Ok(receipt) if receipt.success => (true, None),
                Ok(receipt) => (false, Some(receipt.message)),
                Err(err) => (false, Some(err.to_string())),
            };

            let record = NotificationRecord::new(
                user_id,
                event,
                channel,
                recipient.clone(),
                delivered,
                error.clone(),
                message.job_id,
            );
            // 日志写入失败不中断其余渠道
            if let Err(err) = self.repository.record(&record).await {
                tracing::warn!(%user_id, %channel, "failed to record notification: {}", err);
            }

            metrics::counter!(
                "notifications_dispatched_total",
                "channel" => channel.to_string(),
                "delivered" => delivered.to_string()
            )
            .increment(1);

            outcomes.push(DispatchOutcome {
                channel,
                delivered,
                recipient: Some(recipient),
                reason: error,
            });
        }

        Ok(outcomes)
    }
}
