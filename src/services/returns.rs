use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::{
    db::DbPool,
    entities::{
        cash_transaction, customer,
        customer_product::{self, Entity as CustomerProduct},
        inventory_item::{self, Entity as Inventory},
        return_item::{self, Entity as ReturnItem},
        return_record::{self, Entity as ReturnRecord},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        reconciliation::{self, ReturnPlan},
        CashDirection, ReturnStatus, ReturnType, RETURNED_ITEMS_SENTINEL,
    },
    services::cash::CashService,
};

/// A return request against one product line.
#[derive(Debug, Clone)]
pub struct ProcessReturn {
    pub return_quantity: i32,
    /// Custom refund; defaults to `return_quantity * unit_price`.
    pub refund_amount: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Everything a committed return produced.
#[derive(Debug, Clone)]
pub struct ProcessedReturn {
    pub record: return_record::Model,
    pub item: return_item::Model,
    /// False when a customer return found no inventory row to merge into
    /// (best-effort restock, the return itself still committed).
    pub inventory_restocked: bool,
    /// The refund's ledger write; absent for zero refunds.
    pub cash_transaction: Option<cash_transaction::Model>,
    pub new_cash_balance: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct UpdateReturn {
    pub party_name: String,
    pub total_amount: Decimal,
    pub status: ReturnStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// The return engine: validates a return request and executes the full
/// reconciliation — return record, source line, inventory, cash — as one
/// database transaction. Validation failures write nothing; storage failures
/// roll everything back together.
#[derive(Clone)]
pub struct ReturnService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReturnService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Processes a return of a customer purchase: the sale line shrinks (or
    /// disappears, cascading the customer with its last line), returned
    /// stock merges back into the product's inventory row, and the refund
    /// leaves the cash ledger.
    #[instrument(skip(self, request))]
    pub async fn process_customer_return(
        &self,
        product_id: i32,
        request: ProcessReturn,
    ) -> Result<ProcessedReturn, ServiceError> {
        let txn = self.db.begin().await?;

        // Lock the line for the whole validate-through-commit window so two
        // concurrent returns cannot over-subtract it.
        let line = CustomerProduct::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer product {product_id} not found"))
            })?;

        let owner = customer::Entity::find_by_id(line.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", line.customer_id))
            })?;

        let plan = reconciliation::plan_return(
            line.quantity,
            line.unit_price,
            line.amount_paid,
            request.return_quantity,
            request.refund_amount,
        )?;

        let reason = request
            .reason
            .unwrap_or_else(|| "Customer return".to_string());
        let (record, item) = Self::insert_return_records(
            &txn,
            ReturnType::Customer,
            &line.product_code,
            &line.product_name,
            &owner.name,
            line.unit_price,
            request.return_quantity,
            &plan,
            reason,
            request.notes,
        )
        .await?;

        if plan.line_removed {
            CustomerProduct::delete_by_id(product_id).exec(&txn).await?;
            let remaining = CustomerProduct::find()
                .filter(customer_product::Column::CustomerId.eq(line.customer_id))
                .count(&txn)
                .await?;
            if remaining == 0 {
                customer::Entity::delete_by_id(line.customer_id)
                    .exec(&txn)
                    .await?;
            }
        } else {
            let mut active: customer_product::ActiveModel = line.clone().into();
            active.quantity = Set(plan.new_quantity);
            active.amount_paid = Set(plan.new_amount_paid);
            active.payment_status = Set(plan.new_status.as_str().to_owned());
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?;
        }

        // Returned stock goes back into the row it originally came from
        // (earliest-created match on the product code). Best-effort: a
        // missing row is logged, not fatal.
        let inventory_restocked = match Inventory::find()
            .filter(inventory_item::Column::ProductCode.eq(&line.product_code))
            .order_by_asc(inventory_item::Column::CreatedAt)
            .order_by_asc(inventory_item::Column::Id)
            .lock_exclusive()
            .one(&txn)
            .await?
        {
            Some(row) => {
                let new_quantity = row.quantity + request.return_quantity;
                let mut active: inventory_item::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(chrono::Utc::now());
                active.update(&txn).await?;
                true
            }
            None => {
                warn!(
                    product_code = %line.product_code,
                    "no inventory row for returned product; return processed without restock"
                );
                false
            }
        };

        // No "Returned Items" sentinel row may survive a return.
        Inventory::delete_many()
            .filter(inventory_item::Column::SupplierName.eq(RETURNED_ITEMS_SENTINEL))
            .filter(inventory_item::Column::ProductCode.eq(&line.product_code))
            .exec(&txn)
            .await?;

        let cash = Self::refund_cash(&txn, &record, &owner.name, plan.refund).await?;

        txn.commit().await?;
        self.emit_completed(&record, ReturnType::Customer, &cash).await;

        Ok(ProcessedReturn {
            record,
            item,
            inventory_restocked,
            cash_transaction: cash.as_ref().map(|(t, _)| t.clone()),
            new_cash_balance: cash.map(|(_, b)| b),
        })
    }

    /// Processes a supplier-side return keyed by the inventory row: the
    /// stock leaves the shelf (the row disappears when fully returned) and
    /// the refund leaves the cash ledger.
    #[instrument(skip(self, request))]
    pub async fn process_inventory_return(
        &self,
        item_id: i32,
        request: ProcessReturn,
    ) -> Result<ProcessedReturn, ServiceError> {
        let txn = self.db.begin().await?;

        let row = Inventory::find_by_id(item_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {item_id} not found")))?;

        let plan = reconciliation::plan_return(
            row.quantity,
            row.unit_price,
            row.amount_paid,
            request.return_quantity,
            request.refund_amount,
        )?;

        let reason = request
            .reason
            .unwrap_or_else(|| "Inventory return".to_string());
        let (record, item) = Self::insert_return_records(
            &txn,
            ReturnType::Supplier,
            &row.product_code,
            &row.product_name,
            &row.supplier_name,
            row.unit_price,
            request.return_quantity,
            &plan,
            reason,
            request.notes,
        )
        .await?;

        if plan.line_removed {
            Inventory::delete_by_id(item_id).exec(&txn).await?;
        } else {
            let mut active: inventory_item::ActiveModel = row.clone().into();
            active.quantity = Set(plan.new_quantity);
            active.amount_paid = Set(plan.new_amount_paid);
            active.payment_status = Set(plan.new_status.as_str().to_owned());
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?;
        }

        let cash = Self::refund_cash(&txn, &record, &row.supplier_name, plan.refund).await?;

        txn.commit().await?;
        self.emit_completed(&record, ReturnType::Supplier, &cash).await;

        Ok(ProcessedReturn {
            record,
            item,
            inventory_restocked: false,
            cash_transaction: cash.as_ref().map(|(t, _)| t.clone()),
            new_cash_balance: cash.map(|(_, b)| b),
        })
    }

    /// All returns with their items, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
    ) -> Result<Vec<(return_record::Model, Vec<return_item::Model>)>, ServiceError> {
        let returns = ReturnRecord::find()
            .find_with_related(ReturnItem)
            .order_by_desc(return_record::Column::ReturnDate)
            .order_by_desc(return_record::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(returns)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        id: i32,
    ) -> Result<(return_record::Model, Vec<return_item::Model>), ServiceError> {
        let record = ReturnRecord::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {id} not found")))?;

        let items = ReturnItem::find()
            .filter(return_item::Column::ReturnId.eq(&record.return_id))
            .all(&*self.db)
            .await?;

        Ok((record, items))
    }

    /// Administrative edit of a return's descriptive fields. Deliberately no
    /// reconciliation side effects: the ledger reflects the state at
    /// processing time.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: i32,
        update: UpdateReturn,
    ) -> Result<return_record::Model, ServiceError> {
        let record = ReturnRecord::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {id} not found")))?;

        let return_id = record.return_id.clone();
        let mut active: return_record::ActiveModel = record.into();
        active.party_name = Set(update.party_name);
        active.total_amount = Set(update.total_amount);
        active.status = Set(update.status.as_str().to_owned());
        active.reason = Set(update.reason);
        active.notes = Set(update.notes);
        active.updated_at = Set(chrono::Utc::now());
        let record = active.update(&*self.db).await?;

        self.event_sender.send(Event::ReturnUpdated(return_id)).await;
        Ok(record)
    }

    /// Administrative delete; removes the return and its items, nothing else.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let record = ReturnRecord::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {id} not found")))?;

        let return_id = record.return_id.clone();
        ReturnItem::delete_many()
            .filter(return_item::Column::ReturnId.eq(&return_id))
            .exec(&txn)
            .await?;
        ReturnRecord::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender.send(Event::ReturnDeleted(return_id)).await;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_return_records(
        txn: &sea_orm::DatabaseTransaction,
        return_type: ReturnType,
        product_code: &str,
        product_name: &str,
        party_name: &str,
        unit_price: Decimal,
        return_quantity: i32,
        plan: &ReturnPlan,
        reason: String,
        notes: Option<String>,
    ) -> Result<(return_record::Model, return_item::Model), ServiceError> {
        let now = chrono::Utc::now();

        let record = return_record::ActiveModel {
            return_id: Set(generate_return_id()),
            return_type: Set(return_type.as_str().to_owned()),
            original_order_id: Set(product_code.to_owned()),
            party_name: Set(party_name.to_owned()),
            return_date: Set(now.date_naive()),
            total_amount: Set(plan.refund),
            status: Set(ReturnStatus::Completed.as_str().to_owned()),
            reason: Set(Some(reason)),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let item = return_item::ActiveModel {
            return_id: Set(record.return_id.clone()),
            product_name: Set(product_name.to_owned()),
            product_code: Set(product_code.to_owned()),
            quantity: Set(return_quantity),
            unit_price: Set(unit_price),
            total_price: Set(plan.refund),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        Ok((record, item))
    }

    /// Writes the refund to the cash ledger inside the return transaction.
    /// An overdraw fails here and rolls the whole return back.
    async fn refund_cash(
        txn: &sea_orm::DatabaseTransaction,
        record: &return_record::Model,
        party_name: &str,
        refund: Decimal,
    ) -> Result<Option<(cash_transaction::Model, Decimal)>, ServiceError> {
        if refund <= Decimal::ZERO {
            return Ok(None);
        }
        let description = format!("Refund for return {} ({party_name})", record.return_id);
        let written =
            CashService::record_on(txn, CashDirection::CashOut, refund, Some(description)).await?;
        Ok(Some(written))
    }

    async fn emit_completed(
        &self,
        record: &return_record::Model,
        return_type: ReturnType,
        cash: &Option<(cash_transaction::Model, Decimal)>,
    ) {
        self.event_sender
            .send(Event::ReturnCompleted {
                return_id: record.return_id.clone(),
                return_type,
                refund: record.total_amount,
            })
            .await;

        if let Some((transaction, new_balance)) = cash {
            self.event_sender
                .send(Event::CashRecorded {
                    transaction_id: transaction.id,
                    direction: CashDirection::CashOut,
                    amount: transaction.amount.abs(),
                    new_balance: *new_balance,
                })
                .await;
        }
    }
}

/// Time-based unique return id, e.g. `RET17251234567890042`. The random
/// suffix closes the same-millisecond collision window.
fn generate_return_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("RET{millis}{suffix:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_ids_are_time_based_with_a_numeric_suffix() {
        let id = generate_return_id();
        assert!(id.starts_with("RET"));
        let digits = &id["RET".len()..];
        assert!(digits.len() >= 17);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
