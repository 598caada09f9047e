use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupplierProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupplierProducts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::SupplierId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::ProductName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::ProductCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::UnitPrice)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::PaymentStatus)
                            .string()
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::AmountPaid)
                            .decimal()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupplierProducts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supplier_products_supplier_id")
                            .from(SupplierProducts::Table, SupplierProducts::SupplierId)
                            .to(
                                super::m20250301_000001_create_suppliers_table::Suppliers::Table,
                                super::m20250301_000001_create_suppliers_table::Suppliers::Id,
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
                    .name("idx_supplier_products_supplier_id")
                    .table(SupplierProducts::Table)
                    .col(SupplierProducts::SupplierId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SupplierProducts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SupplierProducts {
    Table,
    Id,
    SupplierId,
    ProductName,
    ProductCode,
    Quantity,
    UnitPrice,
    PaymentStatus,
    AmountPaid,
    CreatedAt,
    UpdatedAt,
}
