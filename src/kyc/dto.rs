use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::{KycStatus, User};

#[derive(Debug, Default, Deserialize)]
pub struct SubmitKycRequest {
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: KycStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    pub document_count: usize,
}

impl KycStatusResponse {
    pub fn for_user(user: &User) -> Self {
        Self {
            success: true,
            message: None,
            status: user.kyc_status,
            submitted_at: user.kyc_submitted_at,
            document_count: user.kyc_documents.len(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
