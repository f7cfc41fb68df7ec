use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{jwt::AuthUser, repo_types::KycStatus},
    error::ApiError,
    extract::ApiJson,
    kyc::{
        dto::{KycStatusResponse, SubmitKycRequest},
        services::{self, ext_from_mime, UploadItem, MAX_UPLOAD_FILES},
    },
    state::AppState,
};

pub fn kyc_routes() -> Router<AppState> {
    Router::new()
        .route("/kyc/status", get(get_status))
        .route("/kyc/submit", post(submit_kyc))
        .route("/kyc/upload", post(upload_documents))
}

#[instrument(skip(state))]
pub async fn get_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<KycStatusResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;
    Ok(Json(KycStatusResponse::for_user(&user)))
}

#[instrument(skip(state, payload))]
pub async fn submit_kyc(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<SubmitKycRequest>,
) -> Result<Json<KycStatusResponse>, ApiError> {
    let documents = services::clean_references(payload.documents)?;
    let user = services::submit(&state, user_id, &documents).await?;

    info!(%user_id, count = documents.len(), "kyc submitted");
    Ok(Json(
        KycStatusResponse::for_user(&user).with_message("KYC submitted for review"),
    ))
}

/// Multipart upload; every part carrying a file name is a document.
#[instrument(skip(state, multipart))]
pub async fn upload_documents(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<KycStatusResponse>, ApiError> {
    let mut multipart = multipart?;

    // Refuse before anything is written to the bucket.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;
    if user.kyc_status == KycStatus::Approved {
        return Err(ApiError::conflict("KYC already approved"));
    }

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if ext_from_mime(&content_type).is_none() {
            warn!(%user_id, %content_type, "kyc upload rejected");
            return Err(ApiError::validation(format!(
                "Unsupported document type: {content_type}"
            )));
        }
        if files.len() == MAX_UPLOAD_FILES {
            return Err(ApiError::validation(format!(
                "At most {MAX_UPLOAD_FILES} files can be uploaded at once"
            )));
        }
        let body = field.bytes().await?;
        if body.is_empty() {
            return Err(ApiError::validation("Uploaded document is empty"));
        }
        files.push(UploadItem { body, content_type });
    }

    let user = services::upload_and_submit(&state, user_id, files).await?;
    Ok(Json(
        KycStatusResponse::for_user(&user).with_message("Documents uploaded successfully"),
    ))
}
