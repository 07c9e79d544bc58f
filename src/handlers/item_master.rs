// src/handlers/item_master.rs
use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;

use crate::dtos::item::{CreateItemRequest, ItemResponse, ItemSearchQuery, UpdateItemRequest};
use crate::error::AppError;
use crate::matching;
use crate::models::item_master::ItemMaster;
use crate::state::AppState;

// POST /items - Add a catalog entry
#[instrument(skip(db_pool, req))]
pub async fn create_item(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Item name must not be empty"));
    }

    if matching::find_by_name(&db_pool, &req.name).await?.is_some() {
        return Err(AppError::conflict("Item already exists"));
    }

    let item = sqlx::query_as::<_, ItemMaster>(
        "INSERT INTO item_master (name, rate, unit) VALUES ($1, $2, $3)
         RETURNING id, name, rate, unit, created_at, updated_at",
    )
    .bind(req.name.trim().to_lowercase())
    .bind(req.rate)
    .bind(&req.unit)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

// GET /items - Whole catalog, ordered by name
#[instrument(skip(db_pool))]
pub async fn list_items(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = sqlx::query_as::<_, ItemMaster>(
        "SELECT id, name, rate, unit, created_at, updated_at FROM item_master ORDER BY name",
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

// GET /items/search - Substring lookup
#[instrument(skip(db_pool))]
pub async fn search_items(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(query): Query<ItemSearchQuery>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = sqlx::query_as::<_, ItemMaster>(
        "SELECT id, name, rate, unit, created_at, updated_at
         FROM item_master WHERE name ILIKE $1 ORDER BY name",
    )
    .bind(format!("%{}%", query.q.to_lowercase()))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

// PUT /items/:id - Change rate/unit, bumping updated_at
#[instrument(skip(db_pool, req), fields(item_id))]
pub async fn update_item(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(item_id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = sqlx::query_as::<_, ItemMaster>(
        "UPDATE item_master SET rate = $2, unit = $3, updated_at = now()
         WHERE id = $1
         RETURNING id, name, rate, unit, created_at, updated_at",
    )
    .bind(item_id)
    .bind(req.rate)
    .bind(&req.unit)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Item not found"))?;

    Ok(Json(ItemResponse::from(item)))
}
