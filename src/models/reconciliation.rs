//! Pure money math shared by the return engine and the commercial records
//! services: line totals, payment-status derivation, partial-payment
//! validation, and return planning against the proportional refund cap.

use rust_decimal::Decimal;

use super::{PaymentStatus, PAYMENT_EPSILON};
use crate::errors::ServiceError;

/// Total value of a product line.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// Outstanding balance of a product line. Always derived, never stored.
pub fn line_balance(quantity: i32, unit_price: Decimal, amount_paid: Decimal) -> Decimal {
    line_total(quantity, unit_price) - amount_paid
}

/// Derives the payment status from the amount paid and the line total.
///
/// Re-deriving after any update yields the same value regardless of call
/// order: the function only looks at its two inputs.
pub fn derive_payment_status(amount_paid: Decimal, total: Decimal) -> PaymentStatus {
    if amount_paid <= Decimal::ZERO || total <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if (amount_paid - total).abs() < PAYMENT_EPSILON {
        PaymentStatus::FullyPaid
    } else {
        PaymentStatus::PartiallyPaid
    }
}

/// Resolves the amount paid that a create/update is allowed to store for the
/// requested payment status:
///
/// - `unpaid` forces 0,
/// - `fully_paid` forces the line total,
/// - `partially_paid` keeps the requested amount but requires
///   `0 < amount < total`.
pub fn reconcile_amount_paid(
    status: PaymentStatus,
    requested: Decimal,
    quantity: i32,
    unit_price: Decimal,
) -> Result<Decimal, ServiceError> {
    let total = line_total(quantity, unit_price);
    match status {
        PaymentStatus::Unpaid => Ok(Decimal::ZERO),
        PaymentStatus::FullyPaid => Ok(total),
        PaymentStatus::PartiallyPaid => {
            if requested <= Decimal::ZERO {
                return Err(ServiceError::InvalidPartialPayment(
                    "for partial payment, amount paid must be greater than 0".to_string(),
                ));
            }
            if requested >= total {
                return Err(ServiceError::InvalidPartialPayment(format!(
                    "for partial payment, amount paid ({requested}) must be less than total amount ({total})"
                )));
            }
            Ok(requested)
        }
    }
}

/// Maximum refund allowed for a partial return: the amount paid scaled by
/// the fraction of the quantity being returned. A party cannot be refunded
/// more than what was proportionally paid for the returned units.
pub fn proportional_refund_cap(
    return_quantity: i32,
    original_quantity: i32,
    amount_paid: Decimal,
) -> Decimal {
    debug_assert!(original_quantity > 0);
    Decimal::from(return_quantity) / Decimal::from(original_quantity) * amount_paid
}

/// Everything a committed return changes on its source line, computed up
/// front so the storage writes are mechanical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnPlan {
    /// The actual refund written to the return record and the cash ledger.
    pub refund: Decimal,
    pub new_quantity: i32,
    pub new_amount_paid: Decimal,
    pub new_status: PaymentStatus,
    /// True for a full return: the source line (and possibly its party) goes away.
    pub line_removed: bool,
}

/// Validates a return request against its source line and computes the
/// reconciled line state. Fails fast; callers write nothing on error.
pub fn plan_return(
    original_quantity: i32,
    unit_price: Decimal,
    amount_paid: Decimal,
    return_quantity: i32,
    requested_refund: Option<Decimal>,
) -> Result<ReturnPlan, ServiceError> {
    if return_quantity <= 0 {
        return Err(ServiceError::InvalidQuantity(
            "return quantity must be greater than 0".to_string(),
        ));
    }
    if return_quantity > original_quantity {
        return Err(ServiceError::InvalidQuantity(format!(
            "return quantity ({return_quantity}) cannot exceed current quantity ({original_quantity})"
        )));
    }

    let refund =
        requested_refund.unwrap_or_else(|| Decimal::from(return_quantity) * unit_price);
    if refund < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "refund amount cannot be negative".to_string(),
        ));
    }

    let cap = proportional_refund_cap(return_quantity, original_quantity, amount_paid);
    if refund > cap + PAYMENT_EPSILON {
        return Err(ServiceError::RefundExceedsCap(format!(
            "refund ({refund}) exceeds the proportional cap ({cap}) for returning \
             {return_quantity} of {original_quantity} units"
        )));
    }

    let new_quantity = original_quantity - return_quantity;
    let new_total = line_total(new_quantity, unit_price);
    let new_amount_paid = (amount_paid - refund).max(Decimal::ZERO);
    let new_status = derive_payment_status(new_amount_paid, new_total);

    Ok(ReturnPlan {
        refund,
        new_quantity,
        new_amount_paid,
        new_status,
        line_removed: new_quantity == 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), dec!(50), PaymentStatus::Unpaid)]
    #[case(dec!(30), dec!(0), PaymentStatus::Unpaid)]
    #[case(dec!(50), dec!(50), PaymentStatus::FullyPaid)]
    #[case(dec!(49.995), dec!(50), PaymentStatus::FullyPaid)]
    #[case(dec!(30), dec!(50), PaymentStatus::PartiallyPaid)]
    fn payment_status_derivation(
        #[case] paid: Decimal,
        #[case] total: Decimal,
        #[case] expected: PaymentStatus,
    ) {
        assert_eq!(derive_payment_status(paid, total), expected);
    }

    #[test]
    fn unpaid_forces_zero_amount() {
        let paid = reconcile_amount_paid(PaymentStatus::Unpaid, dec!(99), 10, dec!(5)).unwrap();
        assert_eq!(paid, dec!(0));
    }

    #[test]
    fn fully_paid_forces_line_total() {
        let paid = reconcile_amount_paid(PaymentStatus::FullyPaid, dec!(1), 10, dec!(5)).unwrap();
        assert_eq!(paid, dec!(50));
    }

    #[test]
    fn partial_payment_must_sit_strictly_between_zero_and_total() {
        assert_matches!(
            reconcile_amount_paid(PaymentStatus::PartiallyPaid, dec!(0), 10, dec!(5)),
            Err(ServiceError::InvalidPartialPayment(_))
        );
        assert_matches!(
            reconcile_amount_paid(PaymentStatus::PartiallyPaid, dec!(50), 10, dec!(5)),
            Err(ServiceError::InvalidPartialPayment(_))
        );
        let ok = reconcile_amount_paid(PaymentStatus::PartiallyPaid, dec!(20), 10, dec!(5));
        assert_eq!(ok.unwrap(), dec!(20));
    }

    // Scenario from the books: 10 units at 5.00, fully paid (50.00). Returning
    // 4 with no explicit refund lands exactly on the proportional cap.
    #[test]
    fn default_refund_on_fully_paid_line_hits_the_cap_exactly() {
        let plan = plan_return(10, dec!(5.00), dec!(50.00), 4, None).unwrap();
        assert_eq!(plan.refund, dec!(20.00));
        assert_eq!(plan.new_quantity, 6);
        assert_eq!(plan.new_amount_paid, dec!(30.00));
        assert_eq!(plan.new_status, PaymentStatus::FullyPaid);
        assert!(!plan.line_removed);
    }

    #[test]
    fn refund_over_cap_is_rejected_not_clamped() {
        let err = plan_return(10, dec!(5.00), dec!(50.00), 4, Some(dec!(25.00))).unwrap_err();
        assert_matches!(err, ServiceError::RefundExceedsCap(_));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert_matches!(
            plan_return(10, dec!(5), dec!(50), 0, None),
            Err(ServiceError::InvalidQuantity(_))
        );
        assert_matches!(
            plan_return(10, dec!(5), dec!(50), -3, None),
            Err(ServiceError::InvalidQuantity(_))
        );
        assert_matches!(
            plan_return(10, dec!(5), dec!(50), 11, None),
            Err(ServiceError::InvalidQuantity(_))
        );
    }

    #[test]
    fn negative_refund_is_rejected() {
        assert_matches!(
            plan_return(10, dec!(5), dec!(50), 2, Some(dec!(-1))),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn full_return_removes_the_line_and_goes_unpaid() {
        let plan = plan_return(10, dec!(5.00), dec!(50.00), 10, None).unwrap();
        assert_eq!(plan.new_quantity, 0);
        assert!(plan.line_removed);
        assert_eq!(plan.new_amount_paid, dec!(0));
        assert_eq!(plan.new_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn partial_return_of_partially_paid_line() {
        // 8 units at 10.00, 40.00 paid. Returning 2 caps the refund at 10.00.
        let plan = plan_return(8, dec!(10.00), dec!(40.00), 2, Some(dec!(10.00))).unwrap();
        assert_eq!(plan.refund, dec!(10.00));
        assert_eq!(plan.new_quantity, 6);
        assert_eq!(plan.new_amount_paid, dec!(30.00));
        assert_eq!(plan.new_status, PaymentStatus::PartiallyPaid);
    }

    #[test]
    fn unpaid_line_accepts_only_zero_refund() {
        let plan = plan_return(5, dec!(4.00), dec!(0), 2, Some(dec!(0))).unwrap();
        assert_eq!(plan.refund, dec!(0));
        assert_eq!(plan.new_amount_paid, dec!(0));
        assert_eq!(plan.new_status, PaymentStatus::Unpaid);

        // The default refund (quantity x price) exceeds what was paid.
        assert_matches!(
            plan_return(5, dec!(4.00), dec!(0), 2, None),
            Err(ServiceError::RefundExceedsCap(_))
        );
    }

    proptest! {
        // For all accepted plans: quantities reconcile and the refund never
        // exceeds the proportional cap (plus the comparison epsilon).
        #[test]
        fn accepted_plans_respect_quantity_and_cap(
            original_quantity in 1i32..1_000,
            return_quantity in 1i32..1_000,
            unit_cents in 0i64..100_000,
            paid_cents in 0i64..10_000_000,
            refund_cents in proptest::option::of(0i64..10_000_000),
        ) {
            let unit_price = Decimal::new(unit_cents, 2);
            let amount_paid = Decimal::new(paid_cents, 2);
            let refund = refund_cents.map(|c| Decimal::new(c, 2));

            if let Ok(plan) = plan_return(
                original_quantity,
                unit_price,
                amount_paid,
                return_quantity,
                refund,
            ) {
                prop_assert_eq!(plan.new_quantity, original_quantity - return_quantity);
                prop_assert!(plan.new_quantity >= 0);
                prop_assert!(plan.new_amount_paid >= Decimal::ZERO);
                let cap = proportional_refund_cap(return_quantity, original_quantity, amount_paid);
                prop_assert!(plan.refund <= cap + PAYMENT_EPSILON);
            }
        }

        // Payment-status derivation is idempotent over its own output state.
        #[test]
        fn derivation_is_stable(paid_cents in 0i64..10_000_000, total_cents in 0i64..10_000_000) {
            let paid = Decimal::new(paid_cents, 2);
            let total = Decimal::new(total_cents, 2);
            let first = derive_payment_status(paid, total);
            prop_assert_eq!(derive_payment_status(paid, total), first);
        }
    }
}
