use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "bill_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillType {
    Gst,
    NonGst,
    Udhar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "bill_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Open,
    Finalized,
    PartiallyPaid,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "adjustment_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    ItemReturn,
    RateCorrection,
    ManualAdjustment,
}

#[derive(Debug, Clone, FromRow)]
pub struct Bill {
    pub id: i64,
    pub customer_id: i64,
    pub bill_type: BillType,
    pub status: BillStatus,
    pub subtotal: f64,
    /// GST percentage, 18 for GST bills and 0 otherwise.
    pub gst_rate: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub invoice_number: Option<String>,
    pub gst_invoice_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub rate: f64,
    pub unit: Option<String>,
    pub subtotal: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: i64,
    pub bill_id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BillAdjustment {
    pub id: i64,
    pub bill_id: i64,
    pub adjustment_type: AdjustmentType,
    pub amount_delta: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
