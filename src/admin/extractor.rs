use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, error::ApiError, state::AppState};

/// An authenticated caller whose email is listed in `ADMIN_EMAILS`.
#[derive(Debug)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;

        if !state.config.is_admin(&user.email) {
            warn!(%user_id, "admin access denied");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser {
            id: user.id,
            email: user.email,
        })
    }
}
