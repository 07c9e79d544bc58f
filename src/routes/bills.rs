use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::bill;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bills", post(bill::create_bill).get(bill::list_bills))
        .route("/bills/summary/daily", get(bill::daily_summary))
        .route("/bills/summary/range", get(bill::range_summary))
        .route("/bills/summary/monthly", get(bill::monthly_summary))
        .route("/bills/{id}", get(bill::get_bill))
        .route("/bills/{id}/items", post(bill::add_bill_item))
        .route("/bills/{id}/finalize", post(bill::finalize_bill))
        .route("/bills/{id}/pay", post(bill::pay_bill))
        .route("/bills/{id}/adjust", post(bill::adjust_bill))
}
