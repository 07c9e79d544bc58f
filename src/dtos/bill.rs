use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::summary::SummaryTotals;
use crate::dtos::customer::CustomerResponse;
use crate::models::bill::{AdjustmentType, Bill, BillAdjustment, BillItem, BillStatus, BillType, Payment};

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    pub customer_id: i64,
    pub bill_type: BillType,
}

#[derive(Debug, Serialize)]
pub struct BillCreatedResponse {
    pub id: i64,
    pub customer_id: i64,
    pub bill_type: BillType,
}

#[derive(Debug, Deserialize)]
pub struct AddBillItemRequest {
    pub item_name: String,
    pub quantity: f64,
    /// Only consulted when the item is not in the catalog.
    pub rate: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillItemResponse {
    pub id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub rate: f64,
    pub unit: Option<String>,
    pub subtotal: f64,
}

impl From<BillItem> for BillItemResponse {
    fn from(item: BillItem) -> Self {
        Self {
            id: item.id,
            item_name: item.item_name,
            quantity: item.quantity,
            rate: item.rate,
            unit: item.unit,
            subtotal: item.subtotal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub bill_id: i64,
    pub status: BillStatus,
    pub subtotal: f64,
    pub gst: f64,
    pub total_amount: f64,
    pub invoice_number: String,
    pub gst_invoice_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayBillRequest {
    pub amount: f64,
    pub method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub bill_id: i64,
    pub status: BillStatus,
    pub paid_amount: f64,
    pub total_amount: f64,
    pub remaining: f64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustBillRequest {
    /// Always a reduction of the bill total.
    pub amount: f64,
    pub reason: Option<String>,
    pub adjustment_type: Option<AdjustmentType>,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentResponse {
    pub bill_id: i64,
    pub adjusted_amount: f64,
    pub new_total: f64,
    pub paid_amount: f64,
    pub remaining: f64,
    pub status: BillStatus,
}

#[derive(Debug, Deserialize)]
pub struct BillListQuery {
    pub customer_id: Option<i64>,
    pub bill_type: Option<BillType>,
    pub status: Option<BillStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct BillListRow {
    pub bill_id: i64,
    pub customer_id: i64,
    pub bill_type: BillType,
    pub status: BillStatus,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PaymentRecordResponse {
    pub id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentRecordResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            method: payment.method,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdjustmentRecordResponse {
    pub id: i64,
    pub adjustment_type: AdjustmentType,
    pub amount_delta: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BillAdjustment> for AdjustmentRecordResponse {
    fn from(adjustment: BillAdjustment) -> Self {
        Self {
            id: adjustment.id,
            adjustment_type: adjustment.adjustment_type,
            amount_delta: adjustment.amount_delta,
            note: adjustment.note,
            created_at: adjustment.created_at,
        }
    }
}

/// Full read model of one bill, as consumed by PDF export and the voice
/// flows.
#[derive(Debug, Serialize)]
pub struct BillDetailResponse {
    pub id: i64,
    pub customer: CustomerResponse,
    pub bill_type: BillType,
    pub status: BillStatus,
    pub subtotal: f64,
    pub gst_rate: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub invoice_number: Option<String>,
    pub gst_invoice_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<BillItemResponse>,
    pub payments: Vec<PaymentRecordResponse>,
    pub adjustments: Vec<AdjustmentRecordResponse>,
}

impl BillDetailResponse {
    pub fn assemble(
        bill: Bill,
        customer: CustomerResponse,
        items: Vec<BillItem>,
        payments: Vec<Payment>,
        adjustments: Vec<BillAdjustment>,
    ) -> Self {
        Self {
            id: bill.id,
            customer,
            bill_type: bill.bill_type,
            status: bill.status,
            subtotal: bill.subtotal,
            gst_rate: bill.gst_rate,
            gst_amount: bill.gst_amount,
            total_amount: bill.total_amount,
            paid_amount: bill.paid_amount,
            invoice_number: bill.invoice_number,
            gst_invoice_number: bill.gst_invoice_number,
            created_at: bill.created_at,
            items: items.into_iter().map(BillItemResponse::from).collect(),
            payments: payments.into_iter().map(PaymentRecordResponse::from).collect(),
            adjustments: adjustments
                .into_iter()
                .map(AdjustmentRecordResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DailySummaryQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: SummaryTotals,
}

#[derive(Debug, Deserialize)]
pub struct RangeSummaryQuery {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct RangeSummaryResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub totals: SummaryTotals,
}

#[derive(Debug, Deserialize)]
pub struct MonthlySummaryQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummaryResponse {
    pub year: i32,
    pub month: u32,
    #[serde(rename = "GST")]
    pub gst: SummaryTotals,
    #[serde(rename = "NON_GST")]
    pub non_gst: SummaryTotals,
    #[serde(rename = "UDHAR")]
    pub udhar: SummaryTotals,
}
