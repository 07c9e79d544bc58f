//! Read-only report aggregation over bill snapshots.
//!
//! Two deliberate flavours of "money received": the bill summaries sum the
//! `paid_amount` snapshot of bills created in the window, while the daily
//! report counts actual payment rows recorded in the window (cash that
//! entered the drawer that day, whichever bill it settled).

use serde::Serialize;

use crate::billing::round2;
use crate::models::bill::BillType;

/// Minimal projection of a bill for aggregation.
#[derive(Debug, Clone)]
pub struct BillSnapshot {
    pub bill_type: BillType,
    pub total_amount: f64,
    pub paid_amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryTotals {
    pub total_bills: i64,
    pub total_sales: f64,
    pub cash_received: f64,
    pub udhar_added: f64,
}

pub fn summarize(bills: &[BillSnapshot]) -> SummaryTotals {
    let total_sales = round2(bills.iter().map(|b| b.total_amount).sum());
    let cash_received = round2(bills.iter().map(|b| b.paid_amount).sum());
    let udhar_added = round2(
        bills
            .iter()
            .filter(|b| b.bill_type == BillType::Udhar)
            .map(|b| b.total_amount - b.paid_amount)
            .sum(),
    );

    SummaryTotals {
        total_bills: bills.len() as i64,
        total_sales,
        cash_received,
        udhar_added,
    }
}

pub fn summarize_by_type(bills: &[BillSnapshot], bill_type: BillType) -> SummaryTotals {
    let filtered: Vec<BillSnapshot> = bills
        .iter()
        .filter(|b| b.bill_type == bill_type)
        .cloned()
        .collect();
    summarize(&filtered)
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesByType {
    pub gst: f64,
    pub non_gst: f64,
    pub udhar: f64,
}

/// Per-type sales plus UDHAR movement for the daily report.
/// `payments_received` comes from the payments table, not from the bills.
#[derive(Debug, Clone, Serialize)]
pub struct DailyBreakdown {
    pub by_bill_type: SalesByType,
    pub cash_received: f64,
    pub udhar_added: f64,
    pub udhar_collected: f64,
}

pub fn daily_breakdown(bills: &[BillSnapshot], payments_received: f64) -> DailyBreakdown {
    let sales_of = |bill_type: BillType| {
        round2(
            bills
                .iter()
                .filter(|b| b.bill_type == bill_type)
                .map(|b| b.total_amount)
                .sum(),
        )
    };

    let udhar: Vec<&BillSnapshot> = bills
        .iter()
        .filter(|b| b.bill_type == BillType::Udhar)
        .collect();

    DailyBreakdown {
        by_bill_type: SalesByType {
            gst: sales_of(BillType::Gst),
            non_gst: sales_of(BillType::NonGst),
            udhar: sales_of(BillType::Udhar),
        },
        cash_received: round2(payments_received),
        udhar_added: round2(udhar.iter().map(|b| b.total_amount).sum()),
        udhar_collected: round2(udhar.iter().map(|b| b.paid_amount).sum()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(bill_type: BillType, total: f64, paid: f64) -> BillSnapshot {
        BillSnapshot {
            bill_type,
            total_amount: total,
            paid_amount: paid,
        }
    }

    #[test]
    fn empty_window_sums_to_zero() {
        let totals = summarize(&[]);
        assert_eq!(
            totals,
            SummaryTotals {
                total_bills: 0,
                total_sales: 0.0,
                cash_received: 0.0,
                udhar_added: 0.0,
            }
        );
    }

    #[test]
    fn totals_cover_all_bill_types() {
        let bills = vec![
            snapshot(BillType::Gst, 236.0, 236.0),
            snapshot(BillType::NonGst, 100.0, 40.0),
            snapshot(BillType::Udhar, 500.0, 150.0),
        ];
        let totals = summarize(&bills);
        assert_eq!(totals.total_bills, 3);
        assert_eq!(totals.total_sales, 836.0);
        assert_eq!(totals.cash_received, 426.0);
        // only the UDHAR bill contributes outstanding credit
        assert_eq!(totals.udhar_added, 350.0);
    }

    #[test]
    fn non_udhar_balances_never_count_as_udhar() {
        let bills = vec![snapshot(BillType::NonGst, 100.0, 0.0)];
        assert_eq!(summarize(&bills).udhar_added, 0.0);
    }

    #[test]
    fn by_type_buckets_are_disjoint() {
        let bills = vec![
            snapshot(BillType::Gst, 236.0, 0.0),
            snapshot(BillType::Gst, 118.0, 118.0),
            snapshot(BillType::Udhar, 50.0, 0.0),
        ];

        let gst = summarize_by_type(&bills, BillType::Gst);
        assert_eq!(gst.total_bills, 2);
        assert_eq!(gst.total_sales, 354.0);
        assert_eq!(gst.udhar_added, 0.0);

        let udhar = summarize_by_type(&bills, BillType::Udhar);
        assert_eq!(udhar.total_bills, 1);
        assert_eq!(udhar.udhar_added, 50.0);

        assert_eq!(summarize_by_type(&bills, BillType::NonGst).total_bills, 0);
    }

    #[test]
    fn daily_breakdown_uses_payment_rows_for_cash() {
        let bills = vec![
            snapshot(BillType::Gst, 236.0, 236.0),
            snapshot(BillType::Udhar, 400.0, 100.0),
        ];
        // Payments recorded today can settle older bills, so the figure is
        // independent of the day's paid_amount snapshots.
        let report = daily_breakdown(&bills, 512.5);
        assert_eq!(report.cash_received, 512.5);
        assert_eq!(report.by_bill_type.gst, 236.0);
        assert_eq!(report.by_bill_type.non_gst, 0.0);
        assert_eq!(report.by_bill_type.udhar, 400.0);
        assert_eq!(report.udhar_added, 400.0);
        assert_eq!(report.udhar_collected, 100.0);
    }
}
