use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::{
        customer::{self, Entity as Customer},
        customer_product::{self, Entity as CustomerProduct},
        inventory_item::{self, Entity as Inventory},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{reconciliation, PaymentStatus},
};

/// Input for recording a sale to a customer. The customer is created
/// implicitly the first time its name appears. When `inventory_id` is set,
/// the sale consumes that row's stock atomically and the whole creation
/// fails with `InsufficientStock` when the row cannot cover it.
#[derive(Debug, Clone)]
pub struct CreateCustomerPurchase {
    pub customer_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
    pub inventory_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct UpdateCustomerPurchase {
    pub customer_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize, utoipa::ToSchema)]
pub struct CustomerStats {
    pub customer_count: i64,
    pub total_products: i64,
    pub total_receivables: Decimal,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize, utoipa::ToSchema)]
pub struct ReceivablesStats {
    pub customer_count: i64,
    pub total_receivables: Decimal,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
    ) -> Result<Vec<(customer::Model, Vec<customer_product::Model>)>, ServiceError> {
        let customers = Customer::find()
            .find_with_related(CustomerProduct)
            .order_by_asc(customer::Column::Name)
            .order_by_asc(customer_product::Column::ProductName)
            .all(&*self.db)
            .await?;
        Ok(customers)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        id: i32,
    ) -> Result<(customer::Model, Vec<customer_product::Model>), ServiceError> {
        let found = Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {id} not found")))?;

        let products = CustomerProduct::find()
            .filter(customer_product::Column::CustomerId.eq(found.id))
            .order_by_asc(customer_product::Column::ProductName)
            .all(&*self.db)
            .await?;

        Ok((found, products))
    }

    /// Records a sale. Stock consumption, customer creation, and the product
    /// line all commit together or not at all.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateCustomerPurchase,
    ) -> Result<(customer::Model, customer_product::Model), ServiceError> {
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

        // The stock check runs first so a failed sale leaves no customer row.
        if let Some(inventory_id) = input.inventory_id {
            let item = Inventory::find_by_id(inventory_id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Inventory item {inventory_id} not found"))
                })?;

            if item.quantity < input.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Available: {}, Requested: {}",
                    item.quantity, input.quantity
                )));
            }

            let new_quantity = item.quantity - input.quantity;
            let mut active: inventory_item::ActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let found = match Customer::find()
            .filter(customer::Column::Name.eq(&input.customer_name))
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                customer::ActiveModel {
                    name: Set(input.customer_name.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        let product = customer_product::ActiveModel {
            customer_id: Set(found.id),
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
            .send(Event::CustomerPurchaseCreated {
                customer_id: found.id,
                product_id: product.id,
            })
            .await;

        Ok((found, product))
    }

    /// Appends a product line to an existing customer.
    #[instrument(skip(self))]
    pub async fn add_product(
        &self,
        customer_id: i32,
        product_name: String,
        product_code: String,
        quantity: i32,
        unit_price: Decimal,
        payment_status: PaymentStatus,
        amount_paid: Decimal,
    ) -> Result<customer_product::Model, ServiceError> {
        let amount_paid =
            reconciliation::reconcile_amount_paid(payment_status, amount_paid, quantity, unit_price)?;
        let status = reconciliation::derive_payment_status(
            amount_paid,
            reconciliation::line_total(quantity, unit_price),
        );

        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {customer_id} not found")))?;

        let now = chrono::Utc::now();
        let product = customer_product::ActiveModel {
            customer_id: Set(customer_id),
            product_name: Set(product_name),
            product_code: Set(product_code),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            payment_status: Set(status.as_str().to_owned()),
            amount_paid: Set(amount_paid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send(Event::CustomerPurchaseCreated {
                customer_id,
                product_id: product.id,
            })
            .await;

        Ok(product)
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        product_id: i32,
        update: UpdateCustomerPurchase,
    ) -> Result<(customer::Model, customer_product::Model), ServiceError> {
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

        let product = CustomerProduct::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer product {product_id} not found"))
            })?;

        let found = Customer::find_by_id(product.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", product.customer_id))
            })?;

        if found.name != update.customer_name {
            let mut active: customer::ActiveModel = found.into();
            active.name = Set(update.customer_name.clone());
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let mut active: customer_product::ActiveModel = product.into();
        active.product_name = Set(update.product_name);
        active.product_code = Set(update.product_code);
        active.quantity = Set(update.quantity);
        active.unit_price = Set(update.unit_price);
        active.payment_status = Set(status.as_str().to_owned());
        active.amount_paid = Set(amount_paid);
        active.updated_at = Set(now);
        let product = active.update(&txn).await?;

        txn.commit().await?;

        let found = Customer::find_by_id(product.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", product.customer_id))
            })?;

        self.event_sender
            .send(Event::CustomerPurchaseUpdated(product_id))
            .await;

        Ok((found, product))
    }

    /// Deletes a sale line; the customer goes with its last line.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let product = CustomerProduct::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer product {product_id} not found"))
            })?;

        let customer_id = product.customer_id;
        CustomerProduct::delete_by_id(product_id).exec(&txn).await?;

        let remaining = CustomerProduct::find()
            .filter(customer_product::Column::CustomerId.eq(customer_id))
            .count(&txn)
            .await?;
        if remaining == 0 {
            Customer::delete_by_id(customer_id).exec(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::CustomerPurchaseDeleted(product_id))
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<CustomerStats, ServiceError> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT
                COUNT(DISTINCT c.id) AS customer_count,
                COUNT(cp.id) AS total_products,
                COALESCE(SUM(cp.quantity * cp.unit_price - cp.amount_paid), 0) AS total_receivables
            FROM customers c
            LEFT JOIN customer_products cp ON c.id = cp.customer_id
            "#
            .to_string(),
        );

        CustomerStats::find_by_statement(stmt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("stats query returned no row".into()))
    }

    #[instrument(skip(self))]
    pub async fn receivables(&self) -> Result<ReceivablesStats, ServiceError> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT
                COUNT(DISTINCT c.id) AS customer_count,
                COALESCE(SUM(cp.quantity * cp.unit_price - cp.amount_paid), 0) AS total_receivables,
                COALESCE(SUM(cp.quantity * cp.unit_price), 0) AS total_amount,
                COALESCE(SUM(cp.amount_paid), 0) AS total_paid
            FROM customers c
            LEFT JOIN customer_products cp ON c.id = cp.customer_id
            "#
            .to_string(),
        );

        ReceivablesStats::find_by_statement(stmt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("receivables query returned no row".into()))
    }
}
