use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractor;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
