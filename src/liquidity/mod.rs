use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod pools;

pub fn router() -> Router<AppState> {
    handlers::liquidity_routes()
}
