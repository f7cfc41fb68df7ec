use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    activity::services::{clamp_limit, timeline, ActivityItem},
    auth::jwt::AuthUser,
    error::ApiError,
    extract::ApiQuery,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub activities: Vec<ActivityItem>,
}

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/activity/mine", get(my_activity))
}

#[instrument(skip(state))]
pub async fn my_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;
    let assets = state.assets.list_by_owner(user_id).await?;

    Ok(Json(ActivityResponse {
        success: true,
        activities: timeline(&user, &assets, clamp_limit(q.limit)),
    }))
}
