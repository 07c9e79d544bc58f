// src/handlers/bill.rs
use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use crate::billing::{self, invoice, summary};
use crate::dtos::bill::{
    AddBillItemRequest, AdjustBillRequest, AdjustmentResponse, BillCreatedResponse,
    BillDetailResponse, BillItemResponse, BillListQuery, BillListRow, CreateBillRequest,
    DailySummaryQuery, DailySummaryResponse, FinalizeResponse, MonthlySummaryQuery,
    MonthlySummaryResponse, PayBillRequest, PaymentResponse, RangeSummaryQuery,
    RangeSummaryResponse,
};
use crate::error::AppError;
use crate::matching;
use crate::models::bill::{
    AdjustmentType, Bill, BillAdjustment, BillItem, BillStatus, BillType, Payment,
};
use crate::models::customer::Customer;
use crate::state::AppState;

// Advisory lock keys serializing the two invoice sequences across
// concurrent finalize transactions.
const INVOICE_SEQ_LOCK: i64 = 0xB11_0001;
const GST_INVOICE_SEQ_LOCK: i64 = 0xB11_0002;

const BILL_COLUMNS: &str = "id, customer_id, bill_type, status, subtotal, gst_rate, gst_amount, \
     total_amount, paid_amount, invoice_number, gst_invoice_number, created_at, updated_at";

fn map_fk_violation(err: sqlx::Error, message: &str) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            AppError::not_found(message)
        }
        other => other.into(),
    }
}

pub(crate) async fn fetch_bill_for_update(
    tx: &mut Transaction<'_, Postgres>,
    bill_id: i64,
) -> Result<Bill, AppError> {
    let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Bill>(&sql)
        .bind(bill_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("Bill not found"))
}

async fn item_subtotals(
    tx: &mut Transaction<'_, Postgres>,
    bill_id: i64,
) -> Result<Vec<f64>, AppError> {
    let subtotals =
        sqlx::query_scalar::<_, f64>("SELECT subtotal FROM bill_items WHERE bill_id = $1 ORDER BY id")
            .bind(bill_id)
            .fetch_all(&mut **tx)
            .await?;
    Ok(subtotals)
}

pub(crate) async fn update_open_totals(
    tx: &mut Transaction<'_, Postgres>,
    bill_id: i64,
) -> Result<billing::BillTotals, AppError> {
    let subtotals = item_subtotals(tx, bill_id).await?;
    let totals = billing::open_totals(&subtotals);
    sqlx::query(
        "UPDATE bills SET subtotal = $2, gst_amount = $3, total_amount = $4, updated_at = now()
         WHERE id = $1",
    )
    .bind(bill_id)
    .bind(totals.subtotal)
    .bind(totals.gst_amount)
    .bind(totals.total_amount)
    .execute(&mut **tx)
    .await?;
    Ok(totals)
}

/// Next number in a sequence, serialized against concurrent finalizes.
/// The lookup is scoped to the current year, so every January restarts
/// the suffix at 0001.
async fn mint_invoice_number(
    tx: &mut Transaction<'_, Postgres>,
    column: &str,
    prefix: &str,
    lock_key: i64,
    year: i32,
) -> Result<String, AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(lock_key)
        .execute(&mut **tx)
        .await?;

    let sql = format!(
        "SELECT {column} FROM bills WHERE {column} LIKE $1 ORDER BY id DESC LIMIT 1"
    );
    let last = sqlx::query_scalar::<_, String>(&sql)
        .bind(format!("{prefix}-{year}-%"))
        .fetch_optional(&mut **tx)
        .await?;

    Ok(invoice::next_number(prefix, year, last.as_deref()))
}

// POST /bills - Open a new bill
#[instrument(skip(db_pool, req))]
pub async fn create_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillCreatedResponse>), AppError> {
    let gst_rate = if req.bill_type == BillType::Gst {
        billing::GST_RATE_PERCENT
    } else {
        0.0
    };

    let sql = format!(
        "INSERT INTO bills (customer_id, bill_type, gst_rate) VALUES ($1, $2, $3)
         RETURNING {BILL_COLUMNS}"
    );
    let bill = sqlx::query_as::<_, Bill>(&sql)
        .bind(req.customer_id)
        .bind(req.bill_type)
        .bind(gst_rate)
        .fetch_one(&db_pool)
        .await
        .map_err(|e| map_fk_violation(e, "Customer not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(BillCreatedResponse {
            id: bill.id,
            customer_id: bill.customer_id,
            bill_type: bill.bill_type,
        }),
    ))
}

// POST /bills/:id/items - Add a line item to an OPEN bill
#[instrument(skip(db_pool, req), fields(bill_id))]
pub async fn add_bill_item(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(bill_id): Path<i64>,
    Json(req): Json<AddBillItemRequest>,
) -> Result<(StatusCode, Json<BillItemResponse>), AppError> {
    if req.quantity <= 0.0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let mut tx = db_pool.begin().await?;

    let bill = fetch_bill_for_update(&mut tx, bill_id).await?;
    billing::ensure_editable(bill.status)?;

    // Catalog rate wins over a caller-supplied one; an unknown item with an
    // explicit rate is added to the catalog as a side effect.
    let (rate, unit) = match matching::find_by_name(&mut *tx, &req.item_name).await? {
        Some(master) => (master.rate, master.unit),
        None => {
            let rate = req.rate.ok_or(billing::BillingError::RateMissing)?;
            sqlx::query("INSERT INTO item_master (name, rate, unit) VALUES ($1, $2, $3)")
                .bind(req.item_name.to_lowercase())
                .bind(rate)
                .bind(&req.unit)
                .execute(&mut *tx)
                .await?;
            (rate, req.unit.clone())
        }
    };

    let subtotal = billing::line_subtotal(req.quantity, rate);

    let item = sqlx::query_as::<_, BillItem>(
        "INSERT INTO bill_items (bill_id, item_name, quantity, rate, unit, subtotal)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, bill_id, item_name, quantity, rate, unit, subtotal, created_at",
    )
    .bind(bill_id)
    .bind(req.item_name.to_lowercase())
    .bind(req.quantity)
    .bind(rate)
    .bind(&unit)
    .bind(subtotal)
    .fetch_one(&mut *tx)
    .await?;

    update_open_totals(&mut tx, bill_id).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(BillItemResponse::from(item))))
}

/// Finalize shared by the direct and voice entry points: one transaction
/// covering the totals, both invoice sequences and the status flip.
pub async fn run_finalize(db_pool: &PgPool, bill_id: i64) -> Result<FinalizeResponse, AppError> {
    let mut tx = db_pool.begin().await?;

    let bill = fetch_bill_for_update(&mut tx, bill_id).await?;
    let subtotals = item_subtotals(&mut tx, bill_id).await?;
    billing::ensure_finalizable(bill.status, subtotals.len())?;

    let totals = billing::finalize_totals(bill.bill_type, bill.gst_rate, &subtotals);
    let year = Utc::now().year();

    let invoice_number = mint_invoice_number(
        &mut tx,
        "invoice_number",
        invoice::GENERIC_PREFIX,
        INVOICE_SEQ_LOCK,
        year,
    )
    .await?;

    let gst_invoice_number = if bill.bill_type == BillType::Gst {
        Some(
            mint_invoice_number(
                &mut tx,
                "gst_invoice_number",
                invoice::GST_PREFIX,
                GST_INVOICE_SEQ_LOCK,
                year,
            )
            .await?,
        )
    } else {
        None
    };

    sqlx::query(
        "UPDATE bills SET subtotal = $2, gst_amount = $3, total_amount = $4,
             invoice_number = $5, gst_invoice_number = $6, status = $7, updated_at = now()
         WHERE id = $1",
    )
    .bind(bill_id)
    .bind(totals.subtotal)
    .bind(totals.gst_amount)
    .bind(totals.total_amount)
    .bind(&invoice_number)
    .bind(&gst_invoice_number)
    .bind(BillStatus::Finalized)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(FinalizeResponse {
        bill_id,
        status: BillStatus::Finalized,
        subtotal: totals.subtotal,
        gst: totals.gst_amount,
        total_amount: totals.total_amount,
        invoice_number,
        gst_invoice_number,
    })
}

// POST /bills/:id/finalize - Lock items, compute GST, mint invoice numbers
#[instrument(skip(db_pool), fields(bill_id))]
pub async fn finalize_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(bill_id): Path<i64>,
) -> Result<Json<FinalizeResponse>, AppError> {
    run_finalize(&db_pool, bill_id).await.map(Json)
}

/// Payment shared by the direct and voice entry points. The payment row
/// and the bill update commit together or not at all.
pub async fn run_payment(
    db_pool: &PgPool,
    bill_id: i64,
    amount: f64,
    method: Option<String>,
) -> Result<PaymentResponse, AppError> {
    let mut tx = db_pool.begin().await?;

    let bill = fetch_bill_for_update(&mut tx, bill_id).await?;
    let outcome = billing::record_payment(bill.status, bill.total_amount, bill.paid_amount, amount)?;

    sqlx::query("INSERT INTO payments (bill_id, amount, method) VALUES ($1, $2, $3)")
        .bind(bill_id)
        .bind(amount)
        .bind(&method)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE bills SET paid_amount = $2, status = $3, updated_at = now() WHERE id = $1")
        .bind(bill_id)
        .bind(outcome.paid_amount)
        .bind(outcome.status)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(PaymentResponse {
        bill_id,
        status: outcome.status,
        paid_amount: outcome.paid_amount,
        total_amount: bill.total_amount,
        remaining: billing::round2(bill.total_amount - outcome.paid_amount),
    })
}

// POST /bills/:id/pay - Record a payment against a finalized bill
#[instrument(skip(db_pool, req), fields(bill_id))]
pub async fn pay_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(bill_id): Path<i64>,
    Json(req): Json<PayBillRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    run_payment(&db_pool, bill_id, req.amount, req.method)
        .await
        .map(Json)
}

// POST /bills/:id/adjust - Reduce the total of a non-OPEN bill
#[instrument(skip(db_pool, req), fields(bill_id))]
pub async fn adjust_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(bill_id): Path<i64>,
    Json(req): Json<AdjustBillRequest>,
) -> Result<Json<AdjustmentResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let bill = fetch_bill_for_update(&mut tx, bill_id).await?;
    let outcome =
        billing::apply_adjustment(bill.status, bill.total_amount, bill.paid_amount, req.amount)?;

    sqlx::query(
        "INSERT INTO bill_adjustments (bill_id, adjustment_type, amount_delta, note)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(bill_id)
    .bind(req.adjustment_type.unwrap_or(AdjustmentType::ManualAdjustment))
    .bind(-req.amount)
    .bind(&req.reason)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE bills SET total_amount = $2, paid_amount = $3, status = $4, updated_at = now()
         WHERE id = $1",
    )
    .bind(bill_id)
    .bind(outcome.total_amount)
    .bind(outcome.paid_amount)
    .bind(outcome.status)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(AdjustmentResponse {
        bill_id,
        adjusted_amount: req.amount,
        new_total: outcome.total_amount,
        paid_amount: outcome.paid_amount,
        remaining: billing::round2(outcome.total_amount - outcome.paid_amount),
        status: outcome.status,
    }))
}

// GET /bills/:id - Full bill read model
#[instrument(skip(db_pool), fields(bill_id))]
pub async fn get_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(bill_id): Path<i64>,
) -> Result<Json<BillDetailResponse>, AppError> {
    let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
    let bill = sqlx::query_as::<_, Bill>(&sql)
        .bind(bill_id)
        .fetch_optional(&db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Bill not found"))?;

    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, address, created_at FROM customers WHERE id = $1",
    )
    .bind(bill.customer_id)
    .fetch_one(&db_pool)
    .await?;

    let items = sqlx::query_as::<_, BillItem>(
        "SELECT id, bill_id, item_name, quantity, rate, unit, subtotal, created_at
         FROM bill_items WHERE bill_id = $1 ORDER BY id",
    )
    .bind(bill_id)
    .fetch_all(&db_pool)
    .await?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, bill_id, amount, method, created_at
         FROM payments WHERE bill_id = $1 ORDER BY id",
    )
    .bind(bill_id)
    .fetch_all(&db_pool)
    .await?;

    let adjustments = sqlx::query_as::<_, BillAdjustment>(
        "SELECT id, bill_id, adjustment_type, amount_delta, note, created_at
         FROM bill_adjustments WHERE bill_id = $1 ORDER BY id",
    )
    .bind(bill_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(BillDetailResponse::assemble(
        bill,
        customer.into(),
        items,
        payments,
        adjustments,
    )))
}

// GET /bills - Bill history with optional filters
#[instrument(skip(db_pool))]
pub async fn list_bills(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<BillListQuery>,
) -> Result<Json<Vec<BillListRow>>, AppError> {
    let mut qb = sqlx::QueryBuilder::<Postgres>::new(
        "SELECT id, customer_id, bill_type, status, total_amount, paid_amount, created_at
         FROM bills WHERE 1=1",
    );

    if let Some(customer_id) = query.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(bill_type) = query.bill_type {
        qb.push(" AND bill_type = ").push_bind(bill_type);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from_date) = query.from_date {
        qb.push(" AND created_at::date >= ").push_bind(from_date);
    }
    if let Some(to_date) = query.to_date {
        qb.push(" AND created_at::date <= ").push_bind(to_date);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    let rows = qb
        .build_query_as::<(
            i64,
            i64,
            BillType,
            BillStatus,
            f64,
            f64,
            chrono::DateTime<Utc>,
        )>()
        .fetch_all(&db_pool)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(
                |(bill_id, customer_id, bill_type, status, total_amount, paid_amount, created_at)| {
                    BillListRow {
                        bill_id,
                        customer_id,
                        bill_type,
                        status,
                        total_amount,
                        paid_amount,
                        created_at,
                    }
                },
            )
            .collect(),
    ))
}

async fn snapshots_between(
    db_pool: &PgPool,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<Vec<summary::BillSnapshot>, AppError> {
    let rows = sqlx::query_as::<_, (BillType, f64, f64)>(
        "SELECT bill_type, total_amount, paid_amount FROM bills
         WHERE created_at::date >= $1 AND created_at::date <= $2",
    )
    .bind(from_date)
    .bind(to_date)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(bill_type, total_amount, paid_amount)| summary::BillSnapshot {
            bill_type,
            total_amount,
            paid_amount,
        })
        .collect())
}

// GET /bills/summary/daily - Totals over bills created on one day
#[instrument(skip(db_pool))]
pub async fn daily_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<DailySummaryQuery>,
) -> Result<Json<DailySummaryResponse>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let bills = snapshots_between(&db_pool, date, date).await?;

    Ok(Json(DailySummaryResponse {
        date,
        totals: summary::summarize(&bills),
    }))
}

// GET /bills/summary/range - Totals over a date range
#[instrument(skip(db_pool))]
pub async fn range_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<RangeSummaryQuery>,
) -> Result<Json<RangeSummaryResponse>, AppError> {
    if query.from_date > query.to_date {
        return Err(AppError::validation("from_date must not be after to_date"));
    }

    let bills = snapshots_between(&db_pool, query.from_date, query.to_date).await?;

    Ok(Json(RangeSummaryResponse {
        from: query.from_date,
        to: query.to_date,
        totals: summary::summarize(&bills),
    }))
}

// GET /bills/summary/monthly - Totals per bill type for one month
#[instrument(skip(db_pool))]
pub async fn monthly_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<MonthlySummaryQuery>,
) -> Result<Json<MonthlySummaryResponse>, AppError> {
    let first = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| AppError::validation("Invalid year/month"))?;
    let last = if query.month == 12 {
        NaiveDate::from_ymd_opt(query.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(query.year, query.month + 1, 1)
    }
    .and_then(|d| d.pred_opt())
    .ok_or_else(|| AppError::validation("Invalid year/month"))?;

    let bills = snapshots_between(&db_pool, first, last).await?;

    Ok(Json(MonthlySummaryResponse {
        year: query.year,
        month: query.month,
        gst: summary::summarize_by_type(&bills, BillType::Gst),
        non_gst: summary::summarize_by_type(&bills, BillType::NonGst),
        udhar: summary::summarize_by_type(&bills, BillType::Udhar),
    }))
}
