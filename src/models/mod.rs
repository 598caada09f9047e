pub mod reconciliation;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Tolerance when comparing monetary values; amounts closer than this are
/// considered equal (mirrors the ledger's two-decimal display precision).
pub const PAYMENT_EPSILON: Decimal = dec!(0.01);

/// Sentinel supplier name that older data sets used for restocked returns.
/// Returns must merge into the product's real inventory row instead; any row
/// carrying this name is purged during return processing.
pub const RETURNED_ITEMS_SENTINEL: &str = "Returned Items";

/// Payment state of a product line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[strum(serialize = "unpaid")]
    Unpaid,
    #[strum(serialize = "partially_paid")]
    PartiallyPaid,
    // "paid" is accepted as an input alias for older clients
    #[strum(to_string = "fully_paid", serialize = "paid")]
    #[serde(alias = "paid")]
    FullyPaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::FullyPaid => "fully_paid",
        }
    }
}

/// Which side of the business a return reconciles against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReturnType {
    Customer,
    Supplier,
}

impl ReturnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Customer => "customer",
            ReturnType::Supplier => "supplier",
        }
    }
}

/// Lifecycle state of a return record. Returns are written as `Completed`;
/// the other states exist for administrative edits only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Completed => "completed",
            ReturnStatus::Cancelled => "cancelled",
        }
    }
}

/// Direction of a cash movement. The stored amount carries the sign
/// (positive for `CashIn`, negative for `CashOut`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CashDirection {
    CashIn,
    CashOut,
}

impl CashDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashDirection::CashIn => "cash_in",
            CashDirection::CashOut => "cash_out",
        }
    }

    /// Applies the direction's sign to a positive amount.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            CashDirection::CashIn => amount,
            CashDirection::CashOut => -amount,
        }
    }
}
