use sea_orm::{
    ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, Statement, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{
        cash_transaction, customer, customer_product, inventory_item, return_item, return_record,
        supplier, supplier_product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Row counts per table, for the settings page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DataCounts {
    pub suppliers: u64,
    pub supplier_products: u64,
    pub inventory: u64,
    pub customers: u64,
    pub customer_products: u64,
    pub cash_transactions: u64,
    pub returns: u64,
    pub return_items: u64,
    pub total: u64,
}

#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl SettingsService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn counts(&self) -> Result<DataCounts, ServiceError> {
        let db = &*self.db;

        let suppliers = supplier::Entity::find().count(db).await?;
        let supplier_products = supplier_product::Entity::find().count(db).await?;
        let inventory = inventory_item::Entity::find().count(db).await?;
        let customers = customer::Entity::find().count(db).await?;
        let customer_products = customer_product::Entity::find().count(db).await?;
        let cash_transactions = cash_transaction::Entity::find().count(db).await?;
        let returns = return_record::Entity::find().count(db).await?;
        let return_items = return_item::Entity::find().count(db).await?;

        let total = suppliers
            + supplier_products
            + inventory
            + customers
            + customer_products
            + cash_transactions
            + returns
            + return_items;

        Ok(DataCounts {
            suppliers,
            supplier_products,
            inventory,
            customers,
            customer_products,
            cash_transactions,
            returns,
            return_items,
            total,
        })
    }

    /// Wipes every table (children before parents) and restarts identity
    /// sequences where the backend has them. One transaction: a failed reset
    /// leaves the books untouched.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        return_item::Entity::delete_many().exec(&txn).await?;
        return_record::Entity::delete_many().exec(&txn).await?;
        customer_product::Entity::delete_many().exec(&txn).await?;
        customer::Entity::delete_many().exec(&txn).await?;
        supplier_product::Entity::delete_many().exec(&txn).await?;
        supplier::Entity::delete_many().exec(&txn).await?;
        inventory_item::Entity::delete_many().exec(&txn).await?;
        cash_transaction::Entity::delete_many().exec(&txn).await?;

        if txn.get_database_backend() == DbBackend::Postgres {
            for sequence in [
                "suppliers_id_seq",
                "supplier_products_id_seq",
                "customers_id_seq",
                "customer_products_id_seq",
                "inventory_id_seq",
                "cash_transactions_id_seq",
                "returns_id_seq",
                "return_items_id_seq",
            ] {
                txn.execute(Statement::from_string(
                    DbBackend::Postgres,
                    format!("ALTER SEQUENCE {sequence} RESTART WITH 1"),
                ))
                .await?;
            }
        }

        txn.commit().await?;

        info!("all ledger data reset");
        self.event_sender.send(Event::DataReset).await;
        Ok(())
    }
}
