use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::voice;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parse-voice", post(voice::parse_voice))
        .route("/parse-voice/test", get(voice::parser_health))
        .route("/parse-voice/confirm-items", post(voice::confirm_items))
        .route("/parse-voice/create-bill", post(voice::create_bill_from_voice))
        .route("/parse-voice/correct-bill", post(voice::correct_bill))
        .route("/parse-voice/finalize-bill", post(voice::finalize_bill_from_voice))
        .route("/parse-voice/pay-bill", post(voice::pay_bill_from_voice))
}
