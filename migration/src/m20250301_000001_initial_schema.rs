use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // api_keys
        manager
            .create_table(
                Table::create()
                    .table(ApiKeys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiKeys::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApiKeys::Key).string().not_null().unique_key())
                    .col(ColumnDef::new(ApiKeys::UserId).uuid().not_null())
                    .col(ColumnDef::new(ApiKeys::AccountEmail).string().not_null())
                    .col(
                        ColumnDef::new(ApiKeys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // jobs
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jobs::UserId).uuid().not_null())
                    .col(ColumnDef::new(Jobs::Name).string().not_null())
                    .col(ColumnDef::new(Jobs::Url).string().not_null())
                    .col(ColumnDef::new(Jobs::Status).string().not_null())
                    .col(ColumnDef::new(Jobs::ScrapeType).string().not_null())
                    .col(ColumnDef::new(Jobs::AiPrompt).text())
                    .col(
                        ColumnDef::new(Jobs::UseVision)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Jobs::AiModel).string())
                    .col(
                        ColumnDef::new(Jobs::ScheduleEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Jobs::Schedule).json())
                    .col(ColumnDef::new(Jobs::NextRunAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Jobs::Config).json().not_null())
                    .col(ColumnDef::new(Jobs::LastRunAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_user_id")
                    .table(Jobs::Table)
                    .col(Jobs::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_status_next_run")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .col(Jobs::NextRunAt)
                    .to_owned(),
            )
            .await?;

        // job_results
        manager
            .create_table(
                Table::create()
                    .table(JobResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobResults::JobId).uuid().not_null())
                    .col(ColumnDef::new(JobResults::Status).string().not_null())
                    .col(ColumnDef::new(JobResults::Data).json().not_null())
                    .col(ColumnDef::new(JobResults::ErrorMessage).text())
                    .col(
                        ColumnDef::new(JobResults::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JobResults::ScrapedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_results_job_id")
                    .table(JobResults::Table)
                    .col(JobResults::JobId)
                    .col(JobResults::ScrapedAt)
                    .to_owned(),
            )
            .await?;

        // products
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::UserId).uuid().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Url).string().not_null())
                    .col(ColumnDef::new(Products::Sources).json())
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // price_history (append-only)
        manager
            .create_table(
                Table::create()
                    .table(PriceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriceHistory::ProductId).uuid().not_null())
                    .col(ColumnDef::new(PriceHistory::Price).double().not_null())
                    .col(ColumnDef::new(PriceHistory::Currency).string().not_null())
                    .col(
                        ColumnDef::new(PriceHistory::InStock)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PriceHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_price_history_product")
                    .table(PriceHistory::Table)
                    .col(PriceHistory::ProductId)
                    .col(PriceHistory::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // websites
        manager
            .create_table(
                Table::create()
                    .table(Websites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Websites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Websites::UserId).uuid().not_null())
                    .col(ColumnDef::new(Websites::Domain).string().not_null())
                    .col(ColumnDef::new(Websites::Category).string())
                    .col(ColumnDef::new(Websites::RateLimitRpm).integer())
                    .col(ColumnDef::new(Websites::ValidationStatus).string().not_null())
                    .col(ColumnDef::new(Websites::AiConfidence).double())
                    .col(
                        ColumnDef::new(Websites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ai_sessions
        manager
            .create_table(
                Table::create()
                    .table(AiSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiSessions::UserId).uuid().not_null())
                    .col(ColumnDef::new(AiSessions::Kind).string().not_null())
                    .col(ColumnDef::new(AiSessions::Model).string().not_null())
                    .col(ColumnDef::new(AiSessions::Query).text().not_null())
                    .col(
                        ColumnDef::new(AiSessions::ItemsFound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AiSessions::Insights).json())
                    .col(
                        ColumnDef::new(AiSessions::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AiSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AiSessions::CompletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // notification_settings (one row per user)
        manager
            .create_table(
                Table::create()
                    .table(NotificationSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationSettings::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NotificationSettings::EmailEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(NotificationSettings::EmailRecipient).string())
                    .col(
                        ColumnDef::new(NotificationSettings::SmsEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(NotificationSettings::SmsRecipient).string())
                    .col(
                        ColumnDef::new(NotificationSettings::WebhookEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(NotificationSettings::WebhookRecipient).string())
                    .col(ColumnDef::new(NotificationSettings::EventToggles).json().not_null())
                    .col(ColumnDef::new(NotificationSettings::MaxPerHour).integer())
                    .col(ColumnDef::new(NotificationSettings::MaxPerDay).integer())
                    .col(
                        ColumnDef::new(NotificationSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AiSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Websites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PriceHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
    Key,
    UserId,
    AccountEmail,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    UserId,
    Name,
    Url,
    Status,
    ScrapeType,
    AiPrompt,
    UseVision,
    AiModel,
    ScheduleEnabled,
    Schedule,
    NextRunAt,
    Config,
    LastRunAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JobResults {
    Table,
    Id,
    JobId,
    Status,
    Data,
    ErrorMessage,
    DurationMs,
    ScrapedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    UserId,
    Name,
    Url,
    Sources,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PriceHistory {
    Table,
    Id,
    ProductId,
    Price,
    Currency,
    InStock,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Websites {
    Table,
    Id,
    UserId,
    Domain,
    Category,
    RateLimitRpm,
    ValidationStatus,
    AiConfidence,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AiSessions {
    Table,
    Id,
    UserId,
    Kind,
    Model,
    Query,
    ItemsFound,
    Insights,
    Completed,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum NotificationSettings {
    Table,
    UserId,
    EmailEnabled,
    EmailRecipient,
    SmsEnabled,
    SmsRecipient,
    WebhookEnabled,
    WebhookRecipient,
    EventToggles,
    MaxPerHour,
    MaxPerDay,
    UpdatedAt,
}
