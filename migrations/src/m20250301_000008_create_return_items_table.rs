use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReturnItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReturnItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReturnItems::ReturnId).string().not_null())
                    .col(ColumnDef::new(ReturnItems::ProductName).string().not_null())
                    .col(ColumnDef::new(ReturnItems::ProductCode).string().not_null())
                    .col(ColumnDef::new(ReturnItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(ReturnItems::UnitPrice)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReturnItems::TotalPrice)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReturnItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_return_items_return_id")
                            .from(ReturnItems::Table, ReturnItems::ReturnId)
                            .to(
                                super::m20250301_000007_create_returns_table::Returns::Table,
                                super::m20250301_000007_create_returns_table::Returns::ReturnId,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_return_items_return_id")
                    .table(ReturnItems::Table)
                    .col(ReturnItems::ReturnId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReturnItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ReturnItems {
    Table,
    Id,
    ReturnId,
    ProductName,
    ProductCode,
    Quantity,
    UnitPrice,
    TotalPrice,
    CreatedAt,
}
