// src/handlers/voice.rs
use axum::http::StatusCode;
use axum::{extract::State, Json};
use serde_json::json;
use sqlx::PgExecutor;
use tracing::instrument;

use crate::billing;
use crate::dtos::bill::{FinalizeResponse, PaymentResponse};
use crate::dtos::item::ItemSuggestion;
use crate::dtos::voice::{
    ConfirmItemsRequest, ConfirmItemsResponse, ConfirmedItem, CorrectBillRequest,
    CorrectBillResponse, CreateBillFromVoiceRequest, ParseVoiceRequest, ParseVoiceResponse,
    ReadyItem, UnmatchedItem, VoiceBillResponse, VoiceFinalizeRequest, VoicePayRequest,
};
use crate::error::AppError;
use crate::handlers::bill::{fetch_bill_for_update, run_finalize, run_payment, update_open_totals};
use crate::matching;
use crate::models::bill::{Bill, BillItem, BillStatus, BillType};
use crate::models::customer::Customer;
use crate::models::item_master::ItemMaster;
use crate::state::AppState;
use crate::voice::{parse_command, BillCommand};

async fn fetch_item<'e>(
    exec: impl PgExecutor<'e>,
    item_id: i64,
) -> sqlx::Result<Option<ItemMaster>> {
    sqlx::query_as::<_, ItemMaster>(
        "SELECT id, name, rate, unit, created_at, updated_at FROM item_master WHERE id = $1",
    )
    .bind(item_id)
    .fetch_optional(exec)
    .await
}

// GET /parse-voice/test - Round-trip check against the LLM
#[instrument(skip(state))]
pub async fn parser_health(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let parser = state
        .voice_parser
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Voice parsing is not configured"))?;

    let reply = parser
        .ping()
        .await
        .map_err(|e| AppError::upstream(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "reply": reply,
        "model": parser.model(),
    })))
}

// POST /parse-voice - Transcript -> structured billing intent
#[instrument(skip(state, req))]
pub async fn parse_voice(
    State(state): State<AppState>,
    Json(req): Json<ParseVoiceRequest>,
) -> Result<Json<ParseVoiceResponse>, AppError> {
    let parser = state
        .voice_parser
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Voice parsing is not configured"))?;

    let intent = parser
        .parse_billing_intent(&req.text)
        .await
        .map_err(|e| AppError::upstream(e.to_string()))?;

    let mut ready_items = Vec::new();
    let mut unmatched_items = Vec::new();

    for spoken in intent.items {
        match matching::find_by_name(&state.db_pool, &spoken.name).await? {
            Some(master) => ready_items.push(ReadyItem {
                item_id: master.id,
                name: master.name,
                rate: master.rate,
                unit: master.unit,
                quantity: spoken.quantity,
            }),
            None => {
                let suggestions = matching::suggest(&state.db_pool, &spoken.name)
                    .await?
                    .into_iter()
                    .map(ItemSuggestion::from)
                    .collect();
                unmatched_items.push(UnmatchedItem {
                    name: spoken.name,
                    quantity: spoken.quantity,
                    price: spoken.price,
                    suggestions,
                });
            }
        }
    }

    let next_action = if unmatched_items.is_empty() {
        "CREATE_BILL"
    } else {
        "CONFIRM_ITEMS"
    };

    Ok(Json(ParseVoiceResponse {
        customer_name: intent.customer_name,
        ready_items,
        unmatched_items,
        next_action,
        model: parser.model().to_string(),
    }))
}

// POST /parse-voice/confirm-items - Validate the user's suggestion picks
#[instrument(skip(db_pool, req))]
pub async fn confirm_items(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<ConfirmItemsRequest>,
) -> Result<Json<ConfirmItemsResponse>, AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("No items confirmed"));
    }

    let mut confirmed = Vec::with_capacity(req.items.len());
    for item_ref in &req.items {
        let master = fetch_item(&db_pool, item_ref.item_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Item {} not found in item master",
                    item_ref.item_id
                ))
            })?;

        confirmed.push(ConfirmedItem {
            item_id: master.id,
            name: master.name,
            rate: master.rate,
            unit: master.unit,
            quantity: item_ref.quantity.unwrap_or(1.0),
        });
    }

    Ok(Json(ConfirmItemsResponse {
        status: "CONFIRMED",
        customer_name: req.customer_name,
        items: confirmed,
        next_action: "CREATE_BILL",
    }))
}

// POST /parse-voice/create-bill - Open a bill from confirmed items
#[instrument(skip(db_pool, req))]
pub async fn create_bill_from_voice(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CreateBillFromVoiceRequest>,
) -> Result<(StatusCode, Json<VoiceBillResponse>), AppError> {
    if req.customer_name.trim().is_empty() {
        return Err(AppError::validation("Customer name must not be empty"));
    }

    let mut tx = db_pool.begin().await?;

    // Find-or-create the customer by spoken name.
    let customer = match sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, address, created_at FROM customers
         WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
    )
    .bind(req.customer_name.trim())
    .fetch_optional(&mut *tx)
    .await?
    {
        Some(customer) => customer,
        None => {
            sqlx::query_as::<_, Customer>(
                "INSERT INTO customers (name) VALUES ($1)
                 RETURNING id, name, phone, address, created_at",
            )
            .bind(req.customer_name.trim())
            .fetch_one(&mut *tx)
            .await?
        }
    };

    let bill_type = req.bill_type.unwrap_or(BillType::NonGst);
    let gst_rate = if bill_type == BillType::Gst {
        billing::GST_RATE_PERCENT
    } else {
        0.0
    };

    let bill = sqlx::query_as::<_, Bill>(
        "INSERT INTO bills (customer_id, bill_type, gst_rate) VALUES ($1, $2, $3)
         RETURNING id, customer_id, bill_type, status, subtotal, gst_rate, gst_amount,
                   total_amount, paid_amount, invoice_number, gst_invoice_number,
                   created_at, updated_at",
    )
    .bind(customer.id)
    .bind(bill_type)
    .bind(gst_rate)
    .fetch_one(&mut *tx)
    .await?;

    for item_ref in &req.items {
        let Some(master) = fetch_item(&mut *tx, item_ref.item_id).await? else {
            // Unknown ids are skipped rather than failing the whole bill.
            continue;
        };

        let quantity = item_ref.quantity.unwrap_or(1.0);
        let subtotal = billing::line_subtotal(quantity, master.rate);

        sqlx::query(
            "INSERT INTO bill_items (bill_id, item_name, quantity, rate, unit, subtotal)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(bill.id)
        .bind(&master.name)
        .bind(quantity)
        .bind(master.rate)
        .bind(&master.unit)
        .bind(subtotal)
        .execute(&mut *tx)
        .await?;
    }

    // Totals carry no GST while the bill stays OPEN for corrections.
    let totals = update_open_totals(&mut tx, bill.id).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(VoiceBillResponse {
            message: "Bill created from voice (OPEN for correction)",
            bill_id: bill.id,
            customer: customer.name,
            bill_type,
            status: BillStatus::Open,
            subtotal: totals.subtotal,
            gst_amount: totals.gst_amount,
            total_amount: totals.total_amount,
            next_action: "VOICE_CORRECTION_OR_FINALIZE",
        }),
    ))
}

// POST /parse-voice/correct-bill - Spoken edits to an OPEN bill
#[instrument(skip(db_pool, req))]
pub async fn correct_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CorrectBillRequest>,
) -> Result<Json<CorrectBillResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let bill = fetch_bill_for_update(&mut tx, req.bill_id).await?;
    billing::ensure_editable(bill.status)?;

    let lines = sqlx::query_as::<_, BillItem>(
        "SELECT id, bill_id, item_name, quantity, rate, unit, subtotal, created_at
         FROM bill_items WHERE bill_id = $1 ORDER BY id",
    )
    .bind(bill.id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(AppError::validation("No items in bill to modify"));
    }

    let command = parse_command(&req.command).ok_or_else(|| {
        AppError::command_not_understood("Could not understand correction command. Please rephrase.")
    })?;

    let target = match &command {
        BillCommand::SetQuantity { item, .. }
        | BillCommand::SetRate { item, .. }
        | BillCommand::RemoveItem { item } => item.clone(),
    };

    let mut changes = Vec::new();

    for line in &lines {
        if !line.item_name.to_lowercase().contains(&target) {
            continue;
        }

        match &command {
            BillCommand::SetQuantity { value, .. } => {
                let subtotal = billing::line_subtotal(*value, line.rate);
                sqlx::query("UPDATE bill_items SET quantity = $2, subtotal = $3 WHERE id = $1")
                    .bind(line.id)
                    .bind(*value)
                    .bind(subtotal)
                    .execute(&mut *tx)
                    .await?;
                changes.push(format!(
                    "Updated {} quantity {} -> {}",
                    line.item_name, line.quantity, value
                ));
            }
            BillCommand::SetRate { value, .. } => {
                let subtotal = billing::line_subtotal(line.quantity, *value);
                sqlx::query("UPDATE bill_items SET rate = $2, subtotal = $3 WHERE id = $1")
                    .bind(line.id)
                    .bind(*value)
                    .bind(subtotal)
                    .execute(&mut *tx)
                    .await?;
                changes.push(format!(
                    "Updated {} rate {} -> {}",
                    line.item_name, line.rate, value
                ));
            }
            BillCommand::RemoveItem { .. } => {
                sqlx::query("DELETE FROM bill_items WHERE id = $1")
                    .bind(line.id)
                    .execute(&mut *tx)
                    .await?;
                changes.push(format!("Removed {}", line.item_name));
            }
        }
    }

    if changes.is_empty() {
        return Err(AppError::not_found(
            "Item mentioned in command not found in bill",
        ));
    }

    let totals = update_open_totals(&mut tx, bill.id).await?;

    tx.commit().await?;

    Ok(Json(CorrectBillResponse {
        message: "Bill updated via voice",
        changes,
        bill_id: bill.id,
        new_total: totals.total_amount,
        next_action: "VOICE_CORRECTION_OR_FINALIZE",
    }))
}

// POST /parse-voice/finalize-bill - Same contract as the direct finalize
#[instrument(skip(db_pool, req))]
pub async fn finalize_bill_from_voice(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<VoiceFinalizeRequest>,
) -> Result<Json<FinalizeResponse>, AppError> {
    run_finalize(&db_pool, req.bill_id).await.map(Json)
}

// POST /parse-voice/pay-bill - Same contract as the direct pay
#[instrument(skip(db_pool, req))]
pub async fn pay_bill_from_voice(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<VoicePayRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let method = req.method.or_else(|| Some("cash".to_string()));
    run_payment(&db_pool, req.bill_id, req.amount, method)
        .await
        .map(Json)
}
