use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    admin::{
        dto::{
            KycDecisionRequest, KycDecisionResponse, KycDetailResponse, KycReviewView,
            RejectRequest, UserListResponse, UsersQuery,
        },
        extractor::AdminUser,
    },
    assets::{
        dto::{AssetListResponse, AssetResponse},
        repo_types::{Asset, AssetStatus},
    },
    auth::{dto::PublicUser, repo_types::KycStatus},
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    kyc::services::presign_documents,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/assets/pending", get(list_pending_assets))
        .route("/admin/assets/:id/approve", post(approve_asset))
        .route("/admin/assets/:id/reject", post(reject_asset))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/kyc", get(get_user_kyc).patch(decide_kyc))
}

#[instrument(skip(state))]
pub async fn list_pending_assets(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AssetListResponse>, ApiError> {
    let assets = state.assets.list_by_status(AssetStatus::Pending).await?;
    Ok(Json(AssetListResponse::new(assets)))
}

/// Runs a review transition out of `pending`, telling "missing" apart from "already decided".
async fn review(
    state: &AppState,
    id: Uuid,
    to: AssetStatus,
    reason: Option<String>,
) -> Result<Asset, ApiError> {
    if let Some(asset) = state
        .assets
        .transition(id, AssetStatus::Pending, to, reason)
        .await?
    {
        return Ok(asset);
    }
    match state.assets.find_by_id(id).await? {
        None => Err(ApiError::not_found("Asset not found")),
        Some(a) if a.status.is_terminal() => Err(ApiError::conflict(format!(
            "Asset is already {} and cannot be reviewed again",
            a.status
        ))),
        Some(a) => Err(ApiError::conflict(format!(
            "Only pending assets can be reviewed (current status: {})",
            a.status
        ))),
    }
}

#[instrument(skip(state))]
pub async fn approve_asset(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AssetResponse>, ApiError> {
    let asset = review(&state, id, AssetStatus::Approved, None).await?;
    info!(admin_id = %admin.id, admin = %admin.email, asset_id = %id, "asset approved");
    Ok(Json(AssetResponse {
        success: true,
        message: "Asset approved".into(),
        asset: asset.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reject_asset(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RejectRequest>,
) -> Result<Json<AssetResponse>, ApiError> {
    let reason = payload
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::validation("Rejection reason is required"))?;

    let asset = review(&state, id, AssetStatus::Rejected, Some(reason)).await?;
    info!(admin_id = %admin.id, admin = %admin.email, asset_id = %id, "asset rejected");
    Ok(Json(AssetResponse {
        success: true,
        message: "Asset rejected".into(),
        asset: asset.into(),
    }))
}

fn parse_kyc_status(raw: &str) -> Result<KycStatus, ApiError> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| ApiError::validation("KYC status must be one of: pending, approved, rejected"))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(q): ApiQuery<UsersQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let status = match q.kyc_status.as_deref() {
        Some(raw) => parse_kyc_status(raw)?,
        None => KycStatus::Pending,
    };
    let users = state.users.list_by_kyc_status(status).await?;
    Ok(Json(UserListResponse {
        success: true,
        users: users.iter().map(KycReviewView::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user_kyc(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<KycDetailResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let documents = presign_documents(&state, &user.kyc_documents).await?;

    Ok(Json(KycDetailResponse {
        success: true,
        user: KycReviewView::from(&user),
        documents,
    }))
}

#[instrument(skip(state, payload))]
pub async fn decide_kyc(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<KycDecisionRequest>,
) -> Result<Json<KycDecisionResponse>, ApiError> {
    let raw = payload
        .status
        .ok_or_else(|| ApiError::validation("KYC status is required"))?;
    let status = parse_kyc_status(&raw)?;

    let user = state
        .users
        .set_kyc_status(id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(admin_id = %admin.id, admin = %admin.email, user_id = %id, %status, "kyc status set");
    Ok(Json(KycDecisionResponse {
        success: true,
        message: format!("KYC status set to {status}"),
        user: PublicUser::from(&user),
    }))
}
