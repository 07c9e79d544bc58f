use axum::{routing::get, Router};

use crate::handlers::report;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/daily", get(report::daily_report))
}
