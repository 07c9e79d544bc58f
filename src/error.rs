// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::billing::BillingError;

/// Request-level failures surfaced to the HTTP caller. Everything except
/// `Unavailable` is a validation failure: no retry, no partial state.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    InvalidState(String),
    RateMissing,
    EmptyBill,
    Overpayment(String),
    InvalidAmount(String),
    Validation(String),
    Conflict(String),
    CommandNotUnderstood(String),
    Upstream(String),
    Unavailable(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::Upstream(msg.into())
    }

    pub fn command_not_understood(msg: impl Into<String>) -> Self {
        AppError::CommandNotUnderstood(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        AppError::Unavailable(msg.into())
    }

    fn status_code_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            AppError::RateMissing => (StatusCode::BAD_REQUEST, "RATE_MISSING"),
            AppError::EmptyBill => (StatusCode::BAD_REQUEST, "EMPTY_BILL"),
            AppError::Overpayment(_) => (StatusCode::BAD_REQUEST, "OVERPAYMENT"),
            AppError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::CommandNotUnderstood(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "COMMAND_NOT_UNDERSTOOD")
            }
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_code_and_kind();

        let message = match &self {
            AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::Overpayment(msg)
            | AppError::InvalidAmount(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::CommandNotUnderstood(msg)
            | AppError::Upstream(msg)
            | AppError::Unavailable(msg) => msg.clone(),
            AppError::RateMissing => "Item has no catalog rate and no rate was supplied".into(),
            AppError::EmptyBill => "Cannot finalize empty bill".into(),
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Storage unavailable");
        AppError::Unavailable("Storage unavailable".into())
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::BillNotOpen
            | BillingError::AlreadyFinalized
            | BillingError::BillNotPayable
            | BillingError::BillNotAdjustable => AppError::InvalidState(err.to_string()),
            BillingError::EmptyBill => AppError::EmptyBill,
            BillingError::RateMissing => AppError::RateMissing,
            BillingError::Overpayment => AppError::Overpayment(err.to_string()),
            BillingError::NonPositivePayment
            | BillingError::NonPositiveAdjustment
            | BillingError::AdjustmentTooLarge => AppError::InvalidAmount(err.to_string()),
        }
    }
}
