use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(KycStatus::Pending),
            "approved" => Ok(KycStatus::Approved),
            "rejected" => Ok(KycStatus::Rejected),
            other => anyhow::bail!("unknown kyc status {other:?}"),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // argon2 PHC string, never serialized
    pub kyc_status: KycStatus,
    pub kyc_documents: Vec<String>,
    pub kyc_submitted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Raw `users` row.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub kyc_status: String,
    pub kyc_documents: Vec<String>,
    pub kyc_submitted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            kyc_status: r.kyc_status.parse()?,
            kyc_documents: r.kyc_documents,
            kyc_submitted_at: r.kyc_submitted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated input for `UserStore::create`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kyc_status_parses_its_own_names() {
        for s in [KycStatus::Pending, KycStatus::Approved, KycStatus::Rejected] {
            assert_eq!(s.as_str().parse::<KycStatus>().unwrap(), s);
        }
        assert!("verified".parse::<KycStatus>().is_err());
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Jane".into(),
            email: "jane@x.com".into(),
            password_hash: "hash".into(),
            kyc_status: "bogus".into(),
            kyc_documents: vec![],
            kyc_submitted_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(User::try_from(row).is_err());
    }
}
