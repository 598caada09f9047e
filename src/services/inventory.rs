use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as Inventory},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{reconciliation, PaymentStatus},
};

/// Aggregate figures over the whole inventory table.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize, utoipa::ToSchema)]
pub struct InventoryStats {
    pub total_items: i64,
    pub total_suppliers: i64,
    pub total_quantity: i64,
    pub total_value: Decimal,
    pub total_outstanding: Decimal,
}

/// Result of a manual stock reduction.
#[derive(Debug, Clone)]
pub struct StockReduction {
    pub item: inventory_item::Model,
    pub quantity_sold: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

/// Fields accepted by a manual inventory update.
#[derive(Debug, Clone)]
pub struct UpdateInventoryItem {
    pub supplier_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// All inventory rows, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let items = Inventory::find()
            .order_by_desc(inventory_item::Column::CreatedAt)
            .order_by_desc(inventory_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<inventory_item::Model, ServiceError> {
        Inventory::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {id} not found")))
    }

    /// Case-insensitive search across product name, supplier name, and
    /// product code.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let items = Inventory::find()
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(inventory_item::Column::ProductName)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(inventory_item::Column::SupplierName)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(inventory_item::Column::ProductCode)))
                            .like(pattern),
                    ),
            )
            .order_by_desc(inventory_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn by_supplier(
        &self,
        supplier_name: &str,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let items = Inventory::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(inventory_item::Column::SupplierName)))
                    .eq(supplier_name.to_lowercase()),
            )
            .order_by_desc(inventory_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    /// Manual adjustment of an inventory row. Amount paid is reconciled
    /// against the requested payment status before anything is written.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: i32,
        update: UpdateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        let amount_paid = reconciliation::reconcile_amount_paid(
            update.payment_status,
            update.amount_paid,
            update.quantity,
            update.unit_price,
        )?;
        let status =
            reconciliation::derive_payment_status(
                amount_paid,
                reconciliation::line_total(update.quantity, update.unit_price),
            );

        let item = self.get(id).await?;
        let mut item: inventory_item::ActiveModel = item.into();
        item.supplier_name = Set(update.supplier_name);
        item.product_name = Set(update.product_name);
        item.product_code = Set(update.product_code);
        item.quantity = Set(update.quantity);
        item.unit_price = Set(update.unit_price);
        item.payment_status = Set(status.as_str().to_owned());
        item.amount_paid = Set(amount_paid);
        item.updated_at = Set(chrono::Utc::now());
        let item = item.update(&*self.db).await?;

        self.event_sender.send(Event::InventoryUpdated(id)).await;
        Ok(item)
    }

    /// Draws sold stock down from an inventory row. The row is locked for
    /// the duration so concurrent sales cannot over-subtract it.
    #[instrument(skip(self))]
    pub async fn reduce_stock(
        &self,
        id: i32,
        quantity_sold: i32,
    ) -> Result<StockReduction, ServiceError> {
        if quantity_sold <= 0 {
            return Err(ServiceError::InvalidQuantity(
                "quantity sold must be greater than 0".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let item = Inventory::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {id} not found")))?;

        if item.quantity < quantity_sold {
            return Err(ServiceError::InsufficientStock(format!(
                "Available: {}, Requested: {}",
                item.quantity, quantity_sold
            )));
        }

        let previous_quantity = item.quantity;
        let new_quantity = previous_quantity - quantity_sold;

        let mut active: inventory_item::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.updated_at = Set(chrono::Utc::now());
        let item = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::StockReduced {
                item_id: id,
                quantity_sold,
                remaining: new_quantity,
            })
            .await;

        Ok(StockReduction {
            item,
            quantity_sold,
            previous_quantity,
            new_quantity,
        })
    }

    /// Manual removal of an inventory row.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let item = self.get(id).await?;
        Inventory::delete_by_id(item.id).exec(&*self.db).await?;
        self.event_sender.send(Event::InventoryDeleted(id)).await;
        Ok(())
    }

    /// Aggregate stats. Outstanding balances are derived in the query and
    /// clamped at zero per row, matching the list views.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<InventoryStats, ServiceError> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT
                COUNT(*) AS total_items,
                COUNT(DISTINCT supplier_name) AS total_suppliers,
                COALESCE(SUM(quantity), 0) AS total_quantity,
                COALESCE(SUM(quantity * unit_price), 0) AS total_value,
                COALESCE(SUM(
                    CASE
                        WHEN (quantity * unit_price) - amount_paid < 0 THEN 0
                        ELSE (quantity * unit_price) - amount_paid
                    END
                ), 0) AS total_outstanding
            FROM inventory
            "#
            .to_string(),
        );

        InventoryStats::find_by_statement(stmt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("stats query returned no row".into()))
    }
}
