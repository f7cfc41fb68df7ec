use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::{KycStatus, User},
    error::ApiError,
    state::AppState,
};

pub const MAX_UPLOAD_FILES: usize = 10;
pub const MAX_REFERENCES: usize = 20;
pub const PRESIGN_TTL: Duration = Duration::from_secs(10 * 60);

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Trimmed, non-empty document references from a JSON submission.
pub fn clean_references(documents: Vec<String>) -> Result<Vec<String>, ApiError> {
    let docs: Vec<String> = documents
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if docs.len() > MAX_REFERENCES {
        return Err(ApiError::validation(format!(
            "At most {MAX_REFERENCES} documents can be submitted at once"
        )));
    }
    Ok(docs)
}

/// Records a submission; approved users cannot resubmit.
pub async fn submit(st: &AppState, user_id: Uuid, documents: &[String]) -> Result<User, ApiError> {
    match st.users.submit_kyc(user_id, documents).await? {
        Some(user) => Ok(user),
        None => Err(already_verified_or_missing(st, user_id).await),
    }
}

async fn already_verified_or_missing(st: &AppState, user_id: Uuid) -> ApiError {
    match st.users.find_by_id(user_id).await {
        Ok(Some(u)) if u.kyc_status == KycStatus::Approved => {
            ApiError::conflict("KYC already approved")
        }
        Ok(_) => ApiError::Unauthorized("Invalid token".into()),
        Err(e) => e.into(),
    }
}

/// Puts every file under `kyc/<user>/`, then records the keys as a submission.
/// Objects already written are removed again if anything after them fails.
pub async fn upload_and_submit(
    st: &AppState,
    user_id: Uuid,
    files: Vec<UploadItem>,
) -> Result<User, ApiError> {
    if files.is_empty() {
        return Err(ApiError::validation("At least one document is required"));
    }

    let mut keys = Vec::with_capacity(files.len());
    for file in files {
        let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
        let key = format!("kyc/{}/{}.{}", user_id, Uuid::new_v4(), ext);
        let put = st
            .objects
            .put(&key, file.body, &file.content_type)
            .await
            .with_context(|| format!("upload kyc document {key}"));
        if let Err(e) = put {
            discard(st, &keys).await;
            return Err(e.into());
        }
        keys.push(key);
    }

    match submit(st, user_id, &keys).await {
        Ok(user) => {
            info!(%user_id, count = keys.len(), "kyc documents uploaded");
            Ok(user)
        }
        Err(e) => {
            discard(st, &keys).await;
            Err(e)
        }
    }
}

async fn discard(st: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = st.objects.delete(key).await {
            warn!(error = ?e, %key, "failed to remove orphaned kyc document");
        }
    }
}

/// Presigned GET urls for stored documents; plain references are passed through.
pub async fn presign_documents(st: &AppState, keys: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        if k.starts_with("kyc/") {
            out.push(st.objects.presign_get(k, PRESIGN_TTL).await?);
        } else {
            out.push(k.clone());
        }
    }
    Ok(out)
}
