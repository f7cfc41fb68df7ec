use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    assets::repo_types::{Asset, AssetRow, AssetStatus, NewAsset, TokenTerms},
    db::{backend, map_sqlx, StoreResult},
};

/// Asset persistence. Every state change is a single conditional write, so a
/// concurrent caller sees either the old or the new state, never a mix.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn insert(&self, new: NewAsset) -> StoreResult<Asset>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>>;
    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Asset>>;
    /// Newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Asset>>;
    /// Oldest first, any owner.
    async fn list_by_status(&self, status: AssetStatus) -> StoreResult<Vec<Asset>>;
    /// Tokenized and listed assets of any owner.
    async fn list_marketplace(&self) -> StoreResult<Vec<Asset>>;
    async fn find_listed_by_token(&self, token_id: &str) -> StoreResult<Option<Asset>>;
    /// Moves `id` from `from` to `to`; `None` when the asset is missing or not in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
        rejection_reason: Option<String>,
    ) -> StoreResult<Option<Asset>>;
    /// Approved -> tokenized for an owned asset, writing the token fields.
    async fn mint(&self, owner_id: Uuid, id: Uuid, terms: &TokenTerms) -> StoreResult<Option<Asset>>;
    /// Sets `is_listed` on an owned tokenized asset.
    async fn set_listed(&self, owner_id: Uuid, id: Uuid, listed: bool) -> StoreResult<Option<Asset>>;
}

macro_rules! asset_columns {
    () => {
        "id, owner_id, asset_type, description, estimated_value, documents, status, \
         rejection_reason, token_id, token_symbol, token_supply, token_price, is_listed, \
         created_at, updated_at"
    };
}

#[derive(Clone)]
pub struct PgAssetStore {
    db: PgPool,
}

impl PgAssetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_asset(row: Option<AssetRow>) -> StoreResult<Option<Asset>> {
    Ok(row.map(Asset::try_from).transpose()?)
}

fn into_assets(rows: Vec<AssetRow>) -> StoreResult<Vec<Asset>> {
    Ok(rows
        .into_iter()
        .map(Asset::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?)
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn insert(&self, new: NewAsset) -> StoreResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "INSERT INTO assets (id, owner_id, asset_type, description, estimated_value, documents) ",
            "VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            asset_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(new.asset_type.as_str())
        .bind(&new.description)
        .bind(new.estimated_value)
        .bind(&new.documents)
        .fetch_one(&self.db)
        .await
        .map_err(|e| backend(e, "insert asset"))?;
        Ok(Asset::try_from(row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "find asset"))?;
        into_asset(row)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "find owned asset"))?;
        into_asset(row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| backend(e, "list assets by owner"))?;
        into_assets(rows)
    }

    async fn list_by_status(&self, status: AssetStatus) -> StoreResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE status = $1 ORDER BY created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.db)
        .await
        .map_err(|e| backend(e, "list assets by status"))?;
        into_assets(rows)
    }

    async fn list_marketplace(&self) -> StoreResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE status = 'tokenized' AND is_listed ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| backend(e, "list marketplace"))?;
        into_assets(rows)
    }

    async fn find_listed_by_token(&self, token_id: &str) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "SELECT ",
            asset_columns!(),
            " FROM assets WHERE token_id = $1 AND status = 'tokenized' AND is_listed"
        ))
        .bind(token_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "find listed token"))?;
        into_asset(row)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
        rejection_reason: Option<String>,
    ) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "UPDATE assets SET status = $3, rejection_reason = COALESCE($4, rejection_reason), ",
            "updated_at = now() WHERE id = $1 AND status = $2 RETURNING ",
            asset_columns!()
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(rejection_reason)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "transition asset"))?;
        into_asset(row)
    }

    async fn mint(&self, owner_id: Uuid, id: Uuid, terms: &TokenTerms) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "UPDATE assets SET status = 'tokenized', token_id = $3, token_symbol = $4, ",
            "token_supply = $5, token_price = $6, updated_at = now() ",
            "WHERE id = $1 AND owner_id = $2 AND status = 'approved' RETURNING ",
            asset_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&terms.token_id)
        .bind(&terms.symbol)
        .bind(terms.supply)
        .bind(terms.price)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_sqlx(e, "token id", "mint asset"))?;
        into_asset(row)
    }

    async fn set_listed(&self, owner_id: Uuid, id: Uuid, listed: bool) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(concat!(
            "UPDATE assets SET is_listed = $3, updated_at = now() ",
            "WHERE id = $1 AND owner_id = $2 AND status = 'tokenized' RETURNING ",
            asset_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .bind(listed)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| backend(e, "set asset listing"))?;
        into_asset(row)
    }
}
