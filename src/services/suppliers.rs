use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::{
        inventory_item,
        supplier::{self, Entity as Supplier},
        supplier_product::{self, Entity as SupplierProduct},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{reconciliation, PaymentStatus},
};

/// Input for registering a purchase from a supplier. The supplier itself is
/// created implicitly the first time its name appears.
#[derive(Debug, Clone)]
pub struct CreateSupplierProduct {
    pub supplier_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSupplierProduct {
    pub supplier_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize, utoipa::ToSchema)]
pub struct SupplierStats {
    pub supplier_count: i64,
    pub total_products: i64,
    pub total_payables: Decimal,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize, utoipa::ToSchema)]
pub struct PayablesStats {
    pub supplier_count: i64,
    pub total_payables: Decimal,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// All suppliers with their product lines, ordered by name.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
    ) -> Result<Vec<(supplier::Model, Vec<supplier_product::Model>)>, ServiceError> {
        let suppliers = Supplier::find()
            .find_with_related(SupplierProduct)
            .order_by_asc(supplier::Column::Name)
            .order_by_asc(supplier_product::Column::ProductName)
            .all(&*self.db)
            .await?;
        Ok(suppliers)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        id: i32,
    ) -> Result<(supplier::Model, Vec<supplier_product::Model>), ServiceError> {
        let supplier = Supplier::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {id} not found")))?;

        let products = SupplierProduct::find()
            .filter(supplier_product::Column::SupplierId.eq(supplier.id))
            .order_by_asc(supplier_product::Column::ProductName)
            .all(&*self.db)
            .await?;

        Ok((supplier, products))
    }

    /// Registers a purchase: finds or creates the supplier, adds the product
    /// line, and creates the parallel inventory row, all in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateSupplierProduct,
    ) -> Result<(supplier::Model, supplier_product::Model), ServiceError> {
        let amount_paid = reconciliation::reconcile_amount_paid(
            input.payment_status,
            input.amount_paid,
            input.quantity,
            input.unit_price,
        )?;
        let status = reconciliation::derive_payment_status(
            amount_paid,
            reconciliation::line_total(input.quantity, input.unit_price),
        );

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();

        let supplier = match Supplier::find()
            .filter(supplier::Column::Name.eq(&input.supplier_name))
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                supplier::ActiveModel {
                    name: Set(input.supplier_name.clone()),
                    email: Set(input.email.clone()),
                    phone: Set(input.phone.clone()),
                    address: Set(input.address.clone()),
                    contact_person: Set(input.contact_person.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        let product = supplier_product::ActiveModel {
            supplier_id: Set(supplier.id),
            product_name: Set(input.product_name.clone()),
            product_code: Set(input.product_code.clone()),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            payment_status: Set(status.as_str().to_owned()),
            amount_paid: Set(amount_paid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // Stock lands in inventory the moment it is bought.
        inventory_item::ActiveModel {
            supplier_name: Set(input.supplier_name.clone()),
            product_name: Set(input.product_name),
            product_code: Set(input.product_code),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            payment_status: Set(status.as_str().to_owned()),
            amount_paid: Set(amount_paid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::SupplierProductCreated {
                supplier_id: supplier.id,
                product_id: product.id,
            })
            .await;

        Ok((supplier, product))
    }

    /// Updates a purchase line and keeps the matching inventory row in sync.
    /// Stock already sold out of inventory stays sold: the inventory row is
    /// set to the new purchase quantity minus the quantity sold so far.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        product_id: i32,
        update: UpdateSupplierProduct,
    ) -> Result<(supplier::Model, supplier_product::Model), ServiceError> {
        let amount_paid = reconciliation::reconcile_amount_paid(
            update.payment_status,
            update.amount_paid,
            update.quantity,
            update.unit_price,
        )?;
        let status = reconciliation::derive_payment_status(
            amount_paid,
            reconciliation::line_total(update.quantity, update.unit_price),
        );

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();

        let product = SupplierProduct::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier product {product_id} not found"))
            })?;

        let supplier = Supplier::find_by_id(product.supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", product.supplier_id))
            })?;

        let original_quantity = product.quantity;
        let original_product_code = product.product_code.clone();
        let original_supplier_name = supplier.name.clone();

        // How much of the original purchase has already been sold out of
        // inventory determines the inventory quantity after the update.
        let inventory_row = inventory_item::Entity::find()
            .filter(inventory_item::Column::ProductCode.eq(&original_product_code))
            .filter(inventory_item::Column::SupplierName.eq(&original_supplier_name))
            .one(&txn)
            .await?;

        let quantity_sold = inventory_row
            .as_ref()
            .map(|row| original_quantity - row.quantity)
            .unwrap_or(0);
        let new_inventory_quantity = (update.quantity - quantity_sold).max(0);

        if supplier.name != update.supplier_name {
            let mut active: supplier::ActiveModel = supplier.clone().into();
            active.name = Set(update.supplier_name.clone());
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let mut active: supplier_product::ActiveModel = product.into();
        active.product_name = Set(update.product_name.clone());
        active.product_code = Set(update.product_code.clone());
        active.quantity = Set(update.quantity);
        active.unit_price = Set(update.unit_price);
        active.payment_status = Set(status.as_str().to_owned());
        active.amount_paid = Set(amount_paid);
        active.updated_at = Set(now);
        let product = active.update(&txn).await?;

        if let Some(row) = inventory_row {
            let mut active: inventory_item::ActiveModel = row.into();
            active.supplier_name = Set(update.supplier_name.clone());
            active.product_name = Set(update.product_name);
            active.product_code = Set(update.product_code);
            active.quantity = Set(new_inventory_quantity);
            active.unit_price = Set(update.unit_price);
            active.payment_status = Set(status.as_str().to_owned());
            active.amount_paid = Set(amount_paid);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        txn.commit().await?;

        let supplier = Supplier::find_by_id(product.supplier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", product.supplier_id))
            })?;

        self.event_sender
            .send(Event::SupplierProductUpdated(product_id))
            .await;

        Ok((supplier, product))
    }

    /// Deletes a purchase line; the supplier goes with its last line.
    /// Inventory rows are left alone: stock already on the shelf stays.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let product = SupplierProduct::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier product {product_id} not found"))
            })?;

        let supplier_id = product.supplier_id;
        SupplierProduct::delete_by_id(product_id).exec(&txn).await?;

        let remaining = SupplierProduct::find()
            .filter(supplier_product::Column::SupplierId.eq(supplier_id))
            .count(&txn)
            .await?;
        if remaining == 0 {
            Supplier::delete_by_id(supplier_id).exec(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::SupplierProductDeleted(product_id))
            .await;

        Ok(())
    }

    /// Headline figures: supplier count, product count, total payables
    /// (balances derived in the query, never read from storage).
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<SupplierStats, ServiceError> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT
                COUNT(DISTINCT s.id) AS supplier_count,
                COUNT(sp.id) AS total_products,
                COALESCE(SUM(sp.quantity * sp.unit_price - sp.amount_paid), 0) AS total_payables
            FROM suppliers s
            LEFT JOIN supplier_products sp ON s.id = sp.supplier_id
            "#
            .to_string(),
        );

        SupplierStats::find_by_statement(stmt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("stats query returned no row".into()))
    }

    #[instrument(skip(self))]
    pub async fn payables(&self) -> Result<PayablesStats, ServiceError> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT
                COUNT(DISTINCT s.id) AS supplier_count,
                COALESCE(SUM(sp.quantity * sp.unit_price - sp.amount_paid), 0) AS total_payables,
                COALESCE(SUM(sp.quantity * sp.unit_price), 0) AS total_amount,
                COALESCE(SUM(sp.amount_paid), 0) AS total_paid
            FROM suppliers s
            LEFT JOIN supplier_products sp ON s.id = sp.supplier_id
            "#
            .to_string(),
        );

        PayablesStats::find_by_statement(stmt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("payables query returned no row".into()))
    }
}
