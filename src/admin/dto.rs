use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::{
    dto::PublicUser,
    repo_types::User,
};

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub kyc_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KycDecisionRequest {
    pub status: Option<String>,
}

/// A user as seen by a KYC reviewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycReviewView {
    #[serde(flatten)]
    pub user: PublicUser,
    #[serde(with = "time::serde::rfc3339::option")]
    pub kyc_submitted_at: Option<OffsetDateTime>,
    pub document_count: usize,
}

impl From<&User> for KycReviewView {
    fn from(u: &User) -> Self {
        Self {
            user: PublicUser::from(u),
            kyc_submitted_at: u.kyc_submitted_at,
            document_count: u.kyc_documents.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<KycReviewView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycDetailResponse {
    pub success: bool,
    pub user: KycReviewView,
    /// Presigned, short-lived links to the stored documents.
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KycDecisionResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}
