use serde::{Deserialize, Serialize};

use crate::models::item_master::ItemMaster;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub rate: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
}

impl From<ItemMaster> for ItemResponse {
    fn from(item: ItemMaster) -> Self {
        Self {
            id: item.id,
            name: item.name,
            rate: item.rate,
            unit: item.unit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemSearchQuery {
    pub q: String,
}

/// Catalog suggestion shape used by the voice flows.
#[derive(Debug, Serialize)]
pub struct ItemSuggestion {
    pub item_id: i64,
    pub name: String,
    pub rate: f64,
    pub unit: Option<String>,
}

impl From<ItemMaster> for ItemSuggestion {
    fn from(item: ItemMaster) -> Self {
        Self {
            item_id: item.id,
            name: item.name,
            rate: item.rate,
            unit: item.unit,
        }
    }
}
