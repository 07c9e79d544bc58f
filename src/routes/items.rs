use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::item_master;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(item_master::create_item).get(item_master::list_items))
        .route("/items/search", get(item_master::search_items))
        .route("/items/{id}", put(item_master::update_item))
}
