use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerProducts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::CustomerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::ProductName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::ProductCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::UnitPrice)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::PaymentStatus)
                            .string()
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::AmountPaid)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_products_customer_id")
                            .from(CustomerProducts::Table, CustomerProducts::CustomerId)
                            .to(
                                super::m20250301_000003_create_customers_table::Customers::Table,
                                super::m20250301_000003_create_customers_table::Customers::Id,
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
                    .name("idx_customer_products_customer_id")
                    .table(CustomerProducts::Table)
                    .col(CustomerProducts::CustomerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerProducts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CustomerProducts {
    Table,
    Id,
    CustomerId,
    ProductName,
    ProductCode,
    Quantity,
    UnitPrice,
    PaymentStatus,
    AmountPaid,
    CreatedAt,
    UpdatedAt,
}
