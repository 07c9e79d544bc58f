//! Item Master lookups shared by the bill and voice flows.

use sqlx::PgExecutor;

use crate::models::item_master::ItemMaster;

const SUGGESTION_LIMIT: i64 = 5;

/// Exact case-insensitive lookup by name.
pub async fn find_by_name<'e>(
    exec: impl PgExecutor<'e>,
    name: &str,
) -> sqlx::Result<Option<ItemMaster>> {
    sqlx::query_as::<_, ItemMaster>(
        "SELECT id, name, rate, unit, created_at, updated_at
         FROM item_master WHERE lower(name) = lower($1)",
    )
    .bind(name.trim())
    .fetch_optional(exec)
    .await
}

/// Tokens worth matching on: lower-cased words of length >= 3, so unit
/// fragments and connectives don't pull in half the catalog.
pub fn suggestion_tokens(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= 3)
        .collect()
}

/// Closest catalog entries by partial token match.
pub async fn suggest<'e>(
    exec: impl PgExecutor<'e>,
    name: &str,
) -> sqlx::Result<Vec<ItemMaster>> {
    let tokens = suggestion_tokens(name);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let patterns: Vec<String> = tokens.iter().map(|t| format!("%{t}%")).collect();

    sqlx::query_as::<_, ItemMaster>(
        "SELECT id, name, rate, unit, created_at, updated_at
         FROM item_master WHERE name ILIKE ANY($1)
         ORDER BY name LIMIT $2",
    )
    .bind(&patterns)
    .bind(SUGGESTION_LIMIT)
    .fetch_all(exec)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased() {
        assert_eq!(suggestion_tokens("Fevicol SH"), vec!["fevicol"]);
        assert_eq!(
            suggestion_tokens("Asian Paints Primer"),
            vec!["asian", "paints", "primer"]
        );
    }

    #[test]
    fn short_tokens_are_dropped() {
        assert_eq!(suggestion_tokens("5 kg of it"), Vec::<String>::new());
        assert_eq!(suggestion_tokens(""), Vec::<String>::new());
    }
}
