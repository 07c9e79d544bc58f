//! Bill lifecycle rules, free of any I/O.
//!
//! Handlers read the current bill state inside a transaction, run these
//! functions, and persist whatever comes back. Every monetary value is
//! rounded to 2 decimals at the point it is computed.

pub mod invoice;
pub mod ledger;
pub mod summary;

use thiserror::Error;

use crate::models::bill::{BillStatus, BillType};

/// GST percentage applied to GST-type bills.
pub const GST_RATE_PERCENT: f64 = 18.0;

#[derive(Debug, Error, PartialEq)]
pub enum BillingError {
    #[error("Bill is finalized and cannot be modified")]
    BillNotOpen,
    #[error("Bill is already finalized")]
    AlreadyFinalized,
    #[error("Cannot finalize empty bill")]
    EmptyBill,
    #[error("Item has no catalog rate and no rate was supplied")]
    RateMissing,
    #[error("Finalize bill before accepting payment")]
    BillNotPayable,
    #[error("Payment amount must be positive")]
    NonPositivePayment,
    #[error("Payment exceeds bill total")]
    Overpayment,
    #[error("Cannot adjust an open bill")]
    BillNotAdjustable,
    #[error("Adjustment amount must be positive")]
    NonPositiveAdjustment,
    #[error("Adjustment exceeds bill total")]
    AdjustmentTooLarge,
}

/// Round to 2 decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn line_subtotal(quantity: f64, rate: f64) -> f64 {
    round2(quantity * rate)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillTotals {
    pub subtotal: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
}

/// Running totals while a bill is OPEN. GST is deferred to finalize on
/// every entry path, so the total tracks the item subtotals alone.
pub fn open_totals(item_subtotals: &[f64]) -> BillTotals {
    let subtotal = round2(item_subtotals.iter().sum());
    BillTotals {
        subtotal,
        gst_amount: 0.0,
        total_amount: subtotal,
    }
}

/// Final totals at finalize time: subtotal from the items, GST applied to
/// GST-type bills only.
pub fn finalize_totals(bill_type: BillType, gst_rate: f64, item_subtotals: &[f64]) -> BillTotals {
    let subtotal = round2(item_subtotals.iter().sum());
    let gst_amount = if bill_type == BillType::Gst {
        round2(subtotal * gst_rate / 100.0)
    } else {
        0.0
    };
    BillTotals {
        subtotal,
        gst_amount,
        total_amount: round2(subtotal + gst_amount),
    }
}

/// Items may only be added or edited while the bill is OPEN.
pub fn ensure_editable(status: BillStatus) -> Result<(), BillingError> {
    if status == BillStatus::Open {
        Ok(())
    } else {
        Err(BillingError::BillNotOpen)
    }
}

/// Finalize is a one-way door out of OPEN. Re-finalizing would mint fresh
/// invoice numbers, so any later state is rejected.
pub fn ensure_finalizable(status: BillStatus, item_count: usize) -> Result<(), BillingError> {
    if status != BillStatus::Open {
        return Err(BillingError::AlreadyFinalized);
    }
    if item_count == 0 {
        return Err(BillingError::EmptyBill);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentOutcome {
    pub paid_amount: f64,
    pub status: BillStatus,
}

/// Apply a payment to a finalized bill. PAID requires exact equality with
/// the total; anything short stays PARTIALLY_PAID.
pub fn record_payment(
    status: BillStatus,
    total_amount: f64,
    paid_amount: f64,
    amount: f64,
) -> Result<PaymentOutcome, BillingError> {
    if status == BillStatus::Open {
        return Err(BillingError::BillNotPayable);
    }
    if amount <= 0.0 {
        return Err(BillingError::NonPositivePayment);
    }
    let new_paid = round2(paid_amount + amount);
    if new_paid > total_amount {
        return Err(BillingError::Overpayment);
    }
    let status = if new_paid == total_amount {
        BillStatus::Paid
    } else {
        BillStatus::PartiallyPaid
    };
    Ok(PaymentOutcome {
        paid_amount: new_paid,
        status,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentOutcome {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub status: BillStatus,
}

/// Reduce a non-OPEN bill's total, capping paid_amount down if the new
/// total drops below it. The zero-paid check runs first so a bill adjusted
/// down to nothing lands back on FINALIZED, not PAID.
pub fn apply_adjustment(
    status: BillStatus,
    total_amount: f64,
    paid_amount: f64,
    amount: f64,
) -> Result<AdjustmentOutcome, BillingError> {
    if status == BillStatus::Open {
        return Err(BillingError::BillNotAdjustable);
    }
    if amount <= 0.0 {
        return Err(BillingError::NonPositiveAdjustment);
    }
    if amount > total_amount {
        return Err(BillingError::AdjustmentTooLarge);
    }

    let new_total = round2(total_amount - amount);
    let new_paid = if paid_amount > new_total {
        new_total
    } else {
        paid_amount
    };

    let status = if new_paid == 0.0 {
        BillStatus::Finalized
    } else if new_paid == new_total {
        BillStatus::Paid
    } else {
        BillStatus::PartiallyPaid
    };

    Ok(AdjustmentOutcome {
        total_amount: new_total,
        paid_amount: new_paid,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(-1.005_000_1), -1.01);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn line_subtotal_rounds() {
        assert_eq!(line_subtotal(2.0, 100.0), 200.0);
        assert_eq!(line_subtotal(3.0, 33.333), 100.0);
    }

    #[test]
    fn open_totals_carry_no_gst() {
        let totals = open_totals(&[200.0, 50.5]);
        assert_eq!(totals.subtotal, 250.5);
        assert_eq!(totals.gst_amount, 0.0);
        assert_eq!(totals.total_amount, 250.5);
    }

    #[test]
    fn finalize_applies_gst_to_gst_bills_only() {
        let gst = finalize_totals(BillType::Gst, GST_RATE_PERCENT, &[200.0]);
        assert_eq!(gst.subtotal, 200.0);
        assert_eq!(gst.gst_amount, 36.0);
        assert_eq!(gst.total_amount, 236.0);

        for bill_type in [BillType::NonGst, BillType::Udhar] {
            let totals = finalize_totals(bill_type, 0.0, &[200.0]);
            assert_eq!(totals.gst_amount, 0.0);
            assert_eq!(totals.total_amount, 200.0);
        }
    }

    #[test]
    fn finalize_total_is_rounded_sum() {
        let totals = finalize_totals(BillType::Gst, GST_RATE_PERCENT, &[33.33, 66.67]);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.gst_amount, 18.0);
        assert_eq!(totals.total_amount, round2(totals.subtotal + totals.gst_amount));
    }

    #[test]
    fn only_open_bills_accept_items() {
        assert!(ensure_editable(BillStatus::Open).is_ok());
        for status in [BillStatus::Finalized, BillStatus::PartiallyPaid, BillStatus::Paid] {
            assert_eq!(ensure_editable(status), Err(BillingError::BillNotOpen));
        }
    }

    #[test]
    fn finalize_rejects_non_open_and_empty() {
        assert!(ensure_finalizable(BillStatus::Open, 2).is_ok());
        assert_eq!(
            ensure_finalizable(BillStatus::Open, 0),
            Err(BillingError::EmptyBill)
        );
        for status in [BillStatus::Finalized, BillStatus::PartiallyPaid, BillStatus::Paid] {
            assert_eq!(
                ensure_finalizable(status, 2),
                Err(BillingError::AlreadyFinalized)
            );
        }
    }

    #[test]
    fn payment_on_open_bill_is_rejected() {
        assert_eq!(
            record_payment(BillStatus::Open, 236.0, 0.0, 100.0),
            Err(BillingError::BillNotPayable)
        );
    }

    #[test]
    fn partial_then_full_payment() {
        let first = record_payment(BillStatus::Finalized, 236.0, 0.0, 100.0).unwrap();
        assert_eq!(first.paid_amount, 100.0);
        assert_eq!(first.status, BillStatus::PartiallyPaid);

        let second = record_payment(BillStatus::PartiallyPaid, 236.0, 100.0, 136.0).unwrap();
        assert_eq!(second.paid_amount, 236.0);
        assert_eq!(second.status, BillStatus::Paid);
    }

    #[test]
    fn overpayment_is_rejected() {
        assert_eq!(
            record_payment(BillStatus::Finalized, 236.0, 236.0, 0.01),
            Err(BillingError::Overpayment)
        );
        assert_eq!(
            record_payment(BillStatus::PartiallyPaid, 236.0, 200.0, 36.01),
            Err(BillingError::Overpayment)
        );
    }

    #[test]
    fn non_positive_payment_is_rejected() {
        assert_eq!(
            record_payment(BillStatus::Finalized, 236.0, 0.0, 0.0),
            Err(BillingError::NonPositivePayment)
        );
        assert_eq!(
            record_payment(BillStatus::Finalized, 236.0, 0.0, -5.0),
            Err(BillingError::NonPositivePayment)
        );
    }

    #[test]
    fn adjustment_on_open_bill_is_rejected() {
        assert_eq!(
            apply_adjustment(BillStatus::Open, 100.0, 0.0, 10.0),
            Err(BillingError::BillNotAdjustable)
        );
    }

    #[test]
    fn adjustment_bounds() {
        assert_eq!(
            apply_adjustment(BillStatus::Finalized, 100.0, 0.0, 0.0),
            Err(BillingError::NonPositiveAdjustment)
        );
        assert_eq!(
            apply_adjustment(BillStatus::Finalized, 100.0, 0.0, 100.01),
            Err(BillingError::AdjustmentTooLarge)
        );
    }

    #[test]
    fn adjustment_reduces_total_and_keeps_paid_within_it() {
        let out = apply_adjustment(BillStatus::PartiallyPaid, 236.0, 100.0, 36.0).unwrap();
        assert_eq!(out.total_amount, 200.0);
        assert_eq!(out.paid_amount, 100.0);
        assert_eq!(out.status, BillStatus::PartiallyPaid);
        assert!(out.paid_amount <= out.total_amount);
    }

    #[test]
    fn adjustment_caps_paid_and_can_reopen_paid_bill() {
        // Paid in full, then a partial return: the cap drops paid_amount
        // to the new total, which keeps the bill PAID.
        let out = apply_adjustment(BillStatus::Paid, 236.0, 236.0, 36.0).unwrap();
        assert_eq!(out.total_amount, 200.0);
        assert_eq!(out.paid_amount, 200.0);
        assert_eq!(out.status, BillStatus::Paid);

        // Paid partially, adjusted below the amount already paid.
        let out = apply_adjustment(BillStatus::PartiallyPaid, 236.0, 150.0, 100.0).unwrap();
        assert_eq!(out.total_amount, 136.0);
        assert_eq!(out.paid_amount, 136.0);
        assert_eq!(out.status, BillStatus::Paid);
    }

    #[test]
    fn full_adjustment_of_paid_bill_lands_on_finalized() {
        let out = apply_adjustment(BillStatus::Paid, 236.0, 236.0, 236.0).unwrap();
        assert_eq!(out.total_amount, 0.0);
        assert_eq!(out.paid_amount, 0.0);
        assert_eq!(out.status, BillStatus::Finalized);
    }

    #[test]
    fn repeated_adjustments_never_increase_total() {
        let mut total = 500.0;
        let mut paid = 300.0;
        let mut status = BillStatus::PartiallyPaid;
        for amount in [50.0, 120.0, 200.0] {
            let out = apply_adjustment(status, total, paid, amount).unwrap();
            assert!(out.total_amount < total);
            assert!(out.paid_amount <= out.total_amount);
            total = out.total_amount;
            paid = out.paid_amount;
            status = out.status;
        }
        assert_eq!(total, 130.0);
        assert_eq!(paid, 130.0);
        assert_eq!(status, BillStatus::Paid);
    }
}
