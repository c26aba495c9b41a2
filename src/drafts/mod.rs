pub mod draft;
pub mod handlers;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::draft_routes())
        .merge(handlers::photo_routes())
}
