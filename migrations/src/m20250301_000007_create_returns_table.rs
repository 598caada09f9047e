use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Returns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Returns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Returns::ReturnId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Returns::ReturnType).string().not_null())
                    .col(
                        ColumnDef::new(Returns::OriginalOrderId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Returns::PartyName).string().not_null())
                    .col(ColumnDef::new(Returns::ReturnDate).date().not_null())
                    .col(
                        ColumnDef::new(Returns::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Returns::Status).string().not_null())
                    .col(ColumnDef::new(Returns::Reason).string().null())
                    .col(ColumnDef::new(Returns::Notes).text().null())
                    .col(
                        ColumnDef::new(Returns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Returns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Returns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Returns {
    Table,
    Id,
    ReturnId,
    ReturnType,
    OriginalOrderId,
    PartyName,
    ReturnDate,
    TotalAmount,
    Status,
    Reason,
    Notes,
    CreatedAt,
    UpdatedAt,
}
