// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::{
    Channel, EventType, NotificationRecord, NotificationSettings,
};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::notification_repository::NotificationRepository;
use crate::infrastructure::database::entities::notification as notification_entity;
use crate::infrastructure::database::entities::notification_setting as settings_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 通知仓库实现
#[derive(Clone)]
pub struct NotificationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<settings_entity::Model> for NotificationSettings {
    fn from(model: settings_entity::Model) -> Self {
        Self {
            user_id: model.user_id,
            email_enabled: model.email_enabled,
            email_recipient: model.email_recipient,
            sms_enabled: model.sms_enabled,
            sms_recipient: model.sms_recipient,
            webhook_enabled: model.webhook_enabled,
            webhook_recipient: model.webhook_recipient,
            event_toggles: serde_json::from_value(model.event_toggles).unwrap_or_default(),
            quiet_hours_start: model.quiet_hours_start.map(|h| h as u8),
            quiet_hours_end: model.quiet_hours_end.map(|h| h as u8),
            max_per_hour: model.max_per_hour,
            max_per_day: model.max_per_day,
            updated_at: model.updated_at,
        }
    }
}

impl From<NotificationSettings> for settings_entity::ActiveModel {
    fn from(settings: NotificationSettings) -> Self {
        Self {
            user_id: Set(settings.user_id),
            email_enabled: Set(settings.email_enabled),
            email_recipient: Set(settings.email_recipient),
            sms_enabled: Set(settings.sms_enabled),
            sms_recipient: Set(settings.sms_recipient),
            webhook_enabled: Set(settings.webhook_enabled),
            webhook_recipient: Set(settings.webhook_recipient),
            event_toggles: Set(
                serde_json::to_value(&settings.event_toggles).unwrap_or_default()
            ),
            max_per_hour: Set(settings.max_per_hour),
            max_per_day: Set(settings.max_per_day),
            quiet_hours_start: Set(settings.quiet_hours_start.map(|h| h as i32)),
            quiet_hours_end: Set(settings.quiet_hours_end.map(|h| h as i32)),
            updated_at: Set(settings.updated_at),
        }
    }
}

impl From<notification_entity::Model> for NotificationRecord {
    fn from(model: notification_entity::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            event_type: model
                .event_type
                .parse()
                .unwrap_or(EventType::JobCompleted),
            channel: model.channel.parse().unwrap_or(Channel::Email),
            recipient: model.recipient,
            delivered: model.delivered,
            error_message: model.error_message,
            job_id: model.job_id,
            created_at: model.created_at,
        }
    }
}

impl From<NotificationRecord> for notification_entity::ActiveModel {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: Set(record.id),
            user_id: Set(record.user_id),
            event_type: Set(record.event_type.to_string()),
            channel: Set(record.channel.to_string()),
            recipient: Set(record.recipient),
            delivered: Set(record.delivered),
            error_message: Set(record.error_message),
            job_id: Set(record.job_id),
            created_at: Set(record.created_at),
        }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn get_settings(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationSettings>, RepositoryError> {
        let model = settings_entity::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn upsert_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, RepositoryError> {
        let model: settings_entity::ActiveModel = settings.clone().into();

        // 整行覆盖：同一用户再次保存时更新全部列
        settings_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(settings_entity::Column::UserId)
                    .update_columns([
                        settings_entity::Column::EmailEnabled,
                        settings_entity::Column::EmailRecipient,
                        settings_entity::Column::SmsEnabled,
                        settings_entity::Column::SmsRecipient,
                        settings_entity::Column::WebhookEnabled,
                        settings_entity::Column::WebhookRecipient,
                        settings_entity::Column::EventToggles,
                        settings_entity::Column::MaxPerHour,
                        settings_entity::Column::MaxPerDay,
                        settings_entity::Column::QuietHoursStart,
                        settings_entity::Column::QuietHoursEnd,
                        settings_entity::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;

        Ok(settings.clone())
    }

    async fn record(
        &self,
        record: &NotificationRecord,
    ) -> Result<NotificationRecord, RepositoryError> {
        let model: notification_entity::ActiveModel = record.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(record.clone())
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let count = notification_entity::Entity::find()
            .filter(notification_entity::Column::UserId.eq(user_id))
            .filter(notification_entity::Column::Channel.eq(channel.to_string()))
            .filter(notification_entity::Column::Delivered.eq(true))
            .filter(notification_entity::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn find_recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<NotificationRecord>, RepositoryError> {
        let models = notification_entity::Entity::find()
            .filter(notification_entity::Column::UserId.eq(user_id))
            .order_by_desc(notification_entity::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
