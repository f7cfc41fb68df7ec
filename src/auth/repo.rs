use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::repo_types::{KycStatus, NewUser, User, UserRow},
    db::{backend, map_sqlx, StoreResult},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by (already normalized) email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Insert a user; a taken email yields `StoreError::Duplicate("email")`.
    async fn create(&self, new: NewUser) -> StoreResult<User>;
    async fn list_by_kyc_status(&self, status: KycStatus) -> StoreResult<Vec<User>>;
    /// Record a KYC submission. Returns `None` if the user is missing or already approved.
    async fn submit_kyc(&self, id: Uuid, documents: &[String]) -> StoreResult<Option<User>>;
    async fn set_kyc_status(&self, id: Uuid, status: KycStatus) -> StoreResult<Option<User>>;
}

macro_rules! user_columns {
    () => {
        "id, name, email, password_hash, kyc_status, kyc_documents, kyc_submitted_at, created_at, updated_at"
    };
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: Option<UserRow>) -> StoreResult<Option<User>> {
    Ok(row.map(User::try_from).transpose()?)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "find user by email"))?;
        into_user(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "find user by id"))?;
        into_user(row)
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING ",
            user_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_sqlx(e, "email", "insert user"))?;
        Ok(User::try_from(row)?)
    }

    async fn list_by_kyc_status(&self, status: KycStatus) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE kyc_status = $1 ORDER BY created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.db)
        .await
        .map_err(|e| backend(e, "list users by kyc status"))?;
        Ok(rows
            .into_iter()
            .map(User::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn submit_kyc(&self, id: Uuid, documents: &[String]) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users SET kyc_status = 'pending', ",
            "kyc_documents = kyc_documents || $2, ",
            "kyc_submitted_at = now(), updated_at = now() ",
            "WHERE id = $1 AND kyc_status <> 'approved' RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .bind(documents.to_vec())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "submit kyc"))?;
        into_user(row)
    }

    async fn set_kyc_status(&self, id: Uuid, status: KycStatus) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users SET kyc_status = $2, updated_at = now() WHERE id = $1 RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "set kyc status"))?;
        into_user(row)
    }
}
