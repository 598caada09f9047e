pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_suppliers_table;
mod m20250301_000002_create_supplier_products_table;
mod m20250301_000003_create_customers_table;
mod m20250301_000004_create_customer_products_table;
mod m20250301_000005_create_inventory_table;
mod m20250301_000006_create_cash_transactions_table;
mod m20250301_000007_create_returns_table;
mod m20250301_000008_create_return_items_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_suppliers_table::Migration),
            Box::new(m20250301_000002_create_supplier_products_table::Migration),
            Box::new(m20250301_000003_create_customers_table::Migration),
            Box::new(m20250301_000004_create_customer_products_table::Migration),
            Box::new(m20250301_000005_create_inventory_table::Migration),
            Box::new(m20250301_000006_create_cash_transactions_table::Migration),
            Box::new(m20250301_000007_create_returns_table::Migration),
            Box::new(m20250301_000008_create_return_items_table::Migration),
        ]
    }
}
