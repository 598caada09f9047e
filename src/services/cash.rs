use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryOrder, QuerySelect, Set,
    Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::cash_transaction::{self, Entity as CashTransaction},
    errors::ServiceError,
    events::{Event, EventSender},
    models::CashDirection,
};

/// A recorded movement together with the balance it produced.
#[derive(Debug, Clone)]
pub struct RecordedTransaction {
    pub transaction: cash_transaction::Model,
    pub new_balance: Decimal,
}

/// Append-only cash ledger. The balance is always the sum of all signed
/// amounts; nothing here is ever updated in place.
#[derive(Clone)]
pub struct CashService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CashService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a cash movement. `CashOut` first checks the current balance
    /// and fails with `InsufficientCash` (no write) when it would overdraw.
    #[instrument(skip(self))]
    pub async fn record(
        &self,
        direction: CashDirection,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<RecordedTransaction, ServiceError> {
        let txn = self.db.begin().await?;
        let (transaction, new_balance) =
            Self::record_on(&txn, direction, amount, description).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::CashRecorded {
                transaction_id: transaction.id,
                direction,
                amount,
                new_balance,
            })
            .await;

        Ok(RecordedTransaction {
            transaction,
            new_balance,
        })
    }

    /// Ledger write usable inside a caller-owned transaction. The return
    /// engine folds its refund `cash_out` into the reconciliation
    /// transaction through this entry point.
    pub(crate) async fn record_on<C: ConnectionTrait>(
        conn: &C,
        direction: CashDirection,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(cash_transaction::Model, Decimal), ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be greater than 0".to_string(),
            ));
        }

        if direction == CashDirection::CashOut {
            let balance = Self::balance_on(conn).await?;
            if balance < amount {
                return Err(ServiceError::InsufficientCash(format!(
                    "current balance {balance} is {short} short of the requested {amount}",
                    short = amount - balance
                )));
            }
        }

        let transaction = cash_transaction::ActiveModel {
            transaction_type: Set(direction.as_str().to_owned()),
            amount: Set(direction.signed(amount)),
            description: Set(description),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let new_balance = Self::balance_on(conn).await?;
        Ok((transaction, new_balance))
    }

    /// Current balance: the sum of every signed transaction amount.
    #[instrument(skip(self))]
    pub async fn balance(&self) -> Result<Decimal, ServiceError> {
        Self::balance_on(&*self.db).await
    }

    pub(crate) async fn balance_on<C: ConnectionTrait>(conn: &C) -> Result<Decimal, ServiceError> {
        #[derive(Debug, FromQueryResult)]
        struct BalanceRow {
            total: Decimal,
        }

        let stmt = Statement::from_string(
            conn.get_database_backend(),
            "SELECT COALESCE(SUM(amount), 0) AS total FROM cash_transactions".to_string(),
        );

        let row = BalanceRow::find_by_statement(stmt)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::InternalError("balance query returned no row".into()))?;

        Ok(row.total)
    }

    /// All transactions, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<cash_transaction::Model>, ServiceError> {
        let transactions = CashTransaction::find()
            .order_by_desc(cash_transaction::Column::CreatedAt)
            .order_by_desc(cash_transaction::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(transactions)
    }

    /// The most recent `limit` transactions, newest first.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u64) -> Result<Vec<cash_transaction::Model>, ServiceError> {
        let transactions = CashTransaction::find()
            .order_by_desc(cash_transaction::Column::CreatedAt)
            .order_by_desc(cash_transaction::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok(transactions)
    }
}
