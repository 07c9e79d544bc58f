use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::summary::SalesByType;

#[derive(Debug, Deserialize)]
pub struct DailyReportQuery {
    /// Defaults to today.
    pub report_date: Option<NaiveDate>,
}

/// Cash movement for the day. `cash_received` sums payment rows recorded
/// in the window; the UDHAR figures come from the day's bills.
#[derive(Debug, Serialize)]
pub struct PaymentsBlock {
    pub cash_received: f64,
    pub udhar_added: f64,
    pub udhar_collected: f64,
}

#[derive(Debug, Serialize)]
pub struct DailyReportResponse {
    pub date: NaiveDate,
    pub total_bills: i64,
    pub total_sales: f64,
    pub by_bill_type: SalesByType,
    pub payments: PaymentsBlock,
}
