pub mod bills;
pub mod customers;
pub mod items;
pub mod reports;
pub mod voice;

use axum::Router;

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(customers::routes())
        .merge(bills::routes())
        .merge(items::routes())
        .merge(reports::routes())
        .merge(voice::routes())
}
