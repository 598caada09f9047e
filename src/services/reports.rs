use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, FromQueryResult, Statement};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{db::DbPool, errors::ServiceError};

/// Headline figures for the dashboard. All four are derived on demand; the
/// store keeps no aggregate state.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub inventory_value: Decimal,
    pub customer_owing_bills: Decimal,
    pub debt_to_suppliers: Decimal,
    pub cash_on_hand: Decimal,
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        #[derive(FromQueryResult)]
        struct TotalRow {
            total: Decimal,
        }

        let backend = self.db.get_database_backend();
        let sum = |sql: &str| Statement::from_string(backend, sql.to_string());

        let inventory_value = TotalRow::find_by_statement(sum(
            "SELECT COALESCE(SUM(quantity * unit_price), 0) AS total FROM inventory",
        ))
        .one(&*self.db)
        .await?
        .map(|row| row.total)
        .unwrap_or_default();

        let customer_owing_bills = TotalRow::find_by_statement(sum(
            "SELECT COALESCE(SUM(quantity * unit_price - amount_paid), 0) AS total \
             FROM customer_products",
        ))
        .one(&*self.db)
        .await?
        .map(|row| row.total)
        .unwrap_or_default();

        let debt_to_suppliers = TotalRow::find_by_statement(sum(
            "SELECT COALESCE(SUM(quantity * unit_price - amount_paid), 0) AS total \
             FROM supplier_products",
        ))
        .one(&*self.db)
        .await?
        .map(|row| row.total)
        .unwrap_or_default();

        let cash_on_hand = TotalRow::find_by_statement(sum(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM cash_transactions",
        ))
        .one(&*self.db)
        .await?
        .map(|row| row.total)
        .unwrap_or_default();

        Ok(DashboardStats {
            inventory_value,
            customer_owing_bills,
            debt_to_suppliers,
            cash_on_hand,
        })
    }
}
