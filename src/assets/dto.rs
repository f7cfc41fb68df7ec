use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::assets::repo_types::{Asset, AssetStatus, AssetType};

/// Pledge form. Fields are optional so missing ones get a field-specific 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeRequest {
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// Display name; accepted for client compatibility, not stored.
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub total_supply: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    pub is_listed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub asset_type: AssetType,
    pub description: String,
    pub estimated_value: f64,
    pub documents: Vec<String>,
    pub status: AssetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_supply: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_price: Option<f64>,
    pub is_listed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Asset> for AssetView {
    fn from(a: Asset) -> Self {
        let (token_id, token_symbol, token_supply, token_price) = match a.token {
            Some(t) => (Some(t.token_id), Some(t.symbol), Some(t.supply), Some(t.price)),
            None => (None, None, None, None),
        };
        Self {
            id: a.id,
            owner_id: a.owner_id,
            asset_type: a.asset_type,
            description: a.description,
            estimated_value: a.estimated_value,
            documents: a.documents,
            status: a.status,
            rejection_reason: a.rejection_reason,
            token_id,
            token_symbol,
            token_supply,
            token_price,
            is_listed: a.is_listed,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub success: bool,
    pub message: String,
    pub asset: AssetView,
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub success: bool,
    pub assets: Vec<AssetView>,
}

impl AssetListResponse {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            success: true,
            assets: assets.into_iter().map(AssetView::from).collect(),
        }
    }
}
