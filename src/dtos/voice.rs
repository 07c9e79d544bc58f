use serde::{Deserialize, Serialize};

use crate::dtos::item::ItemSuggestion;
use crate::models::bill::{BillStatus, BillType};

#[derive(Debug, Deserialize)]
pub struct ParseVoiceRequest {
    pub text: String,
}

/// Spoken item resolved against the catalog.
#[derive(Debug, Serialize)]
pub struct ReadyItem {
    pub item_id: i64,
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UnmatchedItem {
    pub name: String,
    pub quantity: Option<f64>,
    /// Price as spoken, usable to seed a new catalog entry.
    pub price: Option<f64>,
    pub suggestions: Vec<ItemSuggestion>,
}

#[derive(Debug, Serialize)]
pub struct ParseVoiceResponse {
    pub customer_name: Option<String>,
    pub ready_items: Vec<ReadyItem>,
    pub unmatched_items: Vec<UnmatchedItem>,
    pub next_action: &'static str,
    pub model: String,
}

/// Reference to a confirmed catalog item.
#[derive(Debug, Deserialize)]
pub struct VoiceItemRef {
    pub item_id: i64,
    pub quantity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmItemsRequest {
    pub customer_name: String,
    pub items: Vec<VoiceItemRef>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmedItem {
    pub item_id: i64,
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
    pub quantity: f64,
}

#[derive(Debug, Serialize)]
pub struct ConfirmItemsResponse {
    pub status: &'static str,
    pub customer_name: String,
    pub items: Vec<ConfirmedItem>,
    pub next_action: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CreateBillFromVoiceRequest {
    pub customer_name: String,
    pub bill_type: Option<BillType>,
    pub items: Vec<VoiceItemRef>,
}

#[derive(Debug, Serialize)]
pub struct VoiceBillResponse {
    pub message: &'static str,
    pub bill_id: i64,
    pub customer: String,
    pub bill_type: BillType,
    pub status: BillStatus,
    pub subtotal: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    pub next_action: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CorrectBillRequest {
    pub bill_id: i64,
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct CorrectBillResponse {
    pub message: &'static str,
    pub changes: Vec<String>,
    pub bill_id: i64,
    pub new_total: f64,
    pub next_action: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct VoiceFinalizeRequest {
    pub bill_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct VoicePayRequest {
    pub bill_id: i64,
    pub amount: f64,
    pub method: Option<String>,
}
