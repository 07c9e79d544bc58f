use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::customer;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(customer::create_customer))
        .route("/customers/search", get(customer::search_customers))
        .route("/customers/udhar/outstanding", get(customer::udhar_outstanding))
        .route("/customers/{id}/summary", get(customer::customer_summary))
        .route("/customers/{id}/outstanding", get(customer::customer_outstanding))
        .route("/customers/{id}/ledger", get(customer::customer_ledger))
}
