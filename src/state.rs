// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::gemini::GeminiClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    /// Voice transcript parser; `None` when no API key is configured, in
    /// which case `/parse-voice` answers 503 and everything else works.
    pub voice_parser: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(db_pool: PgPool, voice_parser: Option<GeminiClient>) -> Self {
        Self {
            db_pool,
            voice_parser: voice_parser.map(Arc::new),
        }
    }
}
