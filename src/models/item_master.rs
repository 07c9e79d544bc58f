use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Pricing catalog entry. Names are stored lower-cased; lookups are
/// case-insensitive.
#[derive(Debug, Clone, FromRow)]
pub struct ItemMaster {
    pub id: i64,
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
