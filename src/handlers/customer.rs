// src/handlers/customer.rs
use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::billing::ledger::{build_ledger, EntryKind, LedgerEntry};
use crate::billing::round2;
use crate::dtos::customer::{
    CreateCustomerRequest, CustomerOutstandingResponse, CustomerResponse, CustomerSearchQuery,
    CustomerSearchRow, CustomerSummaryResponse, LedgerResponse, UdharOutstandingRow,
};
use crate::error::AppError;
use crate::models::bill::BillType;
use crate::models::customer::Customer;
use crate::state::AppState;

async fn fetch_customer(db_pool: &PgPool, customer_id: i64) -> Result<Customer, AppError> {
    sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, address, created_at FROM customers WHERE id = $1",
    )
    .bind(customer_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))
}

// POST /customers - Register a customer
#[instrument(skip(db_pool, req))]
pub async fn create_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Customer name must not be empty"));
    }

    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (name, phone, address) VALUES ($1, $2, $3)
         RETURNING id, name, phone, address, created_at",
    )
    .bind(req.name.trim())
    .bind(&req.phone)
    .bind(&req.address)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

// GET /customers/search - Name/phone lookup with pending balance
#[instrument(skip(db_pool))]
pub async fn search_customers(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<CustomerSearchQuery>,
) -> Result<Json<Vec<CustomerSearchRow>>, AppError> {
    let pattern = format!("%{}%", query.q);

    let rows = sqlx::query_as::<_, (i64, String, Option<String>, f64)>(
        "SELECT c.id, c.name, c.phone,
                COALESCE(SUM(CASE WHEN b.total_amount > b.paid_amount
                                  THEN b.total_amount - b.paid_amount ELSE 0 END), 0)
         FROM customers c
         LEFT JOIN bills b ON b.customer_id = c.id
         WHERE c.name ILIKE $1 OR c.phone ILIKE $1
         GROUP BY c.id
         ORDER BY c.name",
    )
    .bind(&pattern)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(customer_id, name, phone, pending)| CustomerSearchRow {
                customer_id,
                name,
                phone,
                pending_amount: round2(pending),
            })
            .collect(),
    ))
}

// GET /customers/:id/summary - Pending balance and latest bill
#[instrument(skip(db_pool), fields(customer_id))]
pub async fn customer_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<CustomerSummaryResponse>, AppError> {
    let customer = fetch_customer(&db_pool, customer_id).await?;

    let pending = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(total_amount - paid_amount), 0)
         FROM bills WHERE customer_id = $1 AND total_amount > paid_amount",
    )
    .bind(customer_id)
    .fetch_one(&db_pool)
    .await?;

    let last_bill = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        "SELECT id, created_at FROM bills WHERE customer_id = $1
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(&db_pool)
    .await?;

    Ok(Json(CustomerSummaryResponse {
        customer_id: customer.id,
        name: customer.name,
        pending_amount: round2(pending),
        last_bill_id: last_bill.map(|(id, _)| id),
        last_bill_date: last_bill.map(|(_, date)| date),
    }))
}

// GET /customers/udhar/outstanding - Credit dashboard across customers
#[instrument(skip(db_pool))]
pub async fn udhar_outstanding(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<UdharOutstandingRow>>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, Option<String>, f64, f64)>(
        "SELECT c.id, c.name, c.phone,
                COALESCE(SUM(b.total_amount), 0), COALESCE(SUM(b.paid_amount), 0)
         FROM customers c
         JOIN bills b ON b.customer_id = c.id
         WHERE b.bill_type = $1
         GROUP BY c.id
         ORDER BY c.name",
    )
    .bind(BillType::Udhar)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .filter_map(|(customer_id, customer_name, phone, total_udhar, paid_amount)| {
                let remaining = round2(total_udhar - paid_amount);
                (remaining > 0.0).then(|| UdharOutstandingRow {
                    customer_id,
                    customer_name,
                    phone,
                    total_udhar,
                    paid_amount,
                    remaining_amount: remaining,
                })
            })
            .collect(),
    ))
}

// GET /customers/:id/outstanding - Credit position of one customer
#[instrument(skip(db_pool), fields(customer_id))]
pub async fn customer_outstanding(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<CustomerOutstandingResponse>, AppError> {
    let customer = fetch_customer(&db_pool, customer_id).await?;

    let (total_udhar, paid_amount) = sqlx::query_as::<_, (f64, f64)>(
        "SELECT COALESCE(SUM(total_amount), 0), COALESCE(SUM(paid_amount), 0)
         FROM bills WHERE customer_id = $1 AND bill_type = $2",
    )
    .bind(customer_id)
    .bind(BillType::Udhar)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(CustomerOutstandingResponse {
        customer_id: customer.id,
        customer_name: customer.name,
        total_udhar,
        paid_amount,
        remaining_amount: round2(total_udhar - paid_amount),
    }))
}

// GET /customers/:id/ledger - Chronological debit/credit statement
#[instrument(skip(db_pool), fields(customer_id))]
pub async fn customer_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<LedgerResponse>, AppError> {
    let customer = fetch_customer(&db_pool, customer_id).await?;

    let bills = sqlx::query_as::<_, (i64, f64, DateTime<Utc>)>(
        "SELECT id, total_amount, created_at FROM bills
         WHERE customer_id = $1 ORDER BY created_at, id",
    )
    .bind(customer_id)
    .fetch_all(&db_pool)
    .await?;

    let payments = sqlx::query_as::<_, (i64, f64, DateTime<Utc>)>(
        "SELECT p.bill_id, p.amount, p.created_at
         FROM payments p JOIN bills b ON p.bill_id = b.id
         WHERE b.customer_id = $1 ORDER BY p.created_at, p.id",
    )
    .bind(customer_id)
    .fetch_all(&db_pool)
    .await?;

    // Debits first so same-timestamp entries resolve bills-before-payments.
    let mut entries = Vec::with_capacity(bills.len() + payments.len());
    for (bill_id, total_amount, created_at) in bills {
        entries.push(LedgerEntry {
            date: created_at,
            kind: EntryKind::Bill,
            reference: format!("Bill #{bill_id}"),
            debit: total_amount,
            credit: 0.0,
        });
    }
    for (bill_id, amount, created_at) in payments {
        entries.push(LedgerEntry {
            date: created_at,
            kind: EntryKind::Payment,
            reference: format!("Payment (Bill #{bill_id})"),
            debit: 0.0,
            credit: amount,
        });
    }

    let (ledger, closing_balance) = build_ledger(entries);

    Ok(Json(LedgerResponse {
        customer_id: customer.id,
        customer_name: customer.name,
        ledger,
        closing_balance,
    }))
}
