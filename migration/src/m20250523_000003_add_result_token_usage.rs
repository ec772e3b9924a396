use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(JobResults::Table)
                    .add_column(
                        ColumnDef::new(JobResults::PromptTokens)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(JobResults::Table)
                    .add_column(
                        ColumnDef::new(JobResults::CompletionTokens)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(JobResults::Table)
                    .drop_column(JobResults::PromptTokens)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(JobResults::Table)
                    .drop_column(JobResults::CompletionTokens)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum JobResults {
    Table,
    PromptTokens,
    CompletionTokens,
}
