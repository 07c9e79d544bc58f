// src/handlers/report.rs
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use tracing::instrument;

use crate::billing::summary;
use crate::dtos::report::{DailyReportQuery, DailyReportResponse, PaymentsBlock};
use crate::error::AppError;
use crate::models::bill::BillType;
use crate::state::AppState;

// GET /reports/daily - Day report: sales per type, cash actually received
#[instrument(skip(db_pool))]
pub async fn daily_report(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<DailyReportQuery>,
) -> Result<Json<DailyReportResponse>, AppError> {
    let date = query.report_date.unwrap_or_else(|| Utc::now().date_naive());

    let rows = sqlx::query_as::<_, (BillType, f64, f64)>(
        "SELECT bill_type, total_amount, paid_amount FROM bills WHERE created_at::date = $1",
    )
    .bind(date)
    .fetch_all(&db_pool)
    .await?;

    let bills: Vec<summary::BillSnapshot> = rows
        .into_iter()
        .map(|(bill_type, total_amount, paid_amount)| summary::BillSnapshot {
            bill_type,
            total_amount,
            paid_amount,
        })
        .collect();

    // Cash received counts payment rows recorded today, whichever bill
    // they settled — distinct from the paid_amount snapshots above.
    let payments_received = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE created_at::date = $1",
    )
    .bind(date)
    .fetch_one(&db_pool)
    .await?;

    let totals = summary::summarize(&bills);
    let breakdown = summary::daily_breakdown(&bills, payments_received);

    Ok(Json(DailyReportResponse {
        date,
        total_bills: totals.total_bills,
        total_sales: totals.total_sales,
        by_bill_type: breakdown.by_bill_type,
        payments: PaymentsBlock {
            cash_received: breakdown.cash_received,
            udhar_added: breakdown.udhar_added,
            udhar_collected: breakdown.udhar_collected,
        },
    }))
}
