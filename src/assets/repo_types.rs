use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    RealEstate,
    Commodities,
    Art,
    PreciousMetals,
    Bonds,
    Other,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::RealEstate,
        AssetType::Commodities,
        AssetType::Art,
        AssetType::PreciousMetals,
        AssetType::Bonds,
        AssetType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::RealEstate => "real_estate",
            AssetType::Commodities => "commodities",
            AssetType::Art => "art",
            AssetType::PreciousMetals => "precious_metals",
            AssetType::Bonds => "bonds",
            AssetType::Other => "other",
        }
    }

    /// Ticker prefix suggested when the owner does not pick a symbol.
    pub fn default_symbol(self) -> &'static str {
        match self {
            AssetType::RealEstate => "RE",
            AssetType::Commodities => "CMDTY",
            AssetType::Art => "ART",
            AssetType::PreciousMetals => "PMTL",
            AssetType::Bonds => "BOND",
            AssetType::Other => "AST",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown asset type {s:?}"))
    }
}

/// Asset lifecycle: pending -> approved -> tokenized, pending -> rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Approved,
    Rejected,
    Tokenized,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Approved => "approved",
            AssetStatus::Rejected => "rejected",
            AssetStatus::Tokenized => "tokenized",
        }
    }

    pub fn can_transition_to(self, next: AssetStatus) -> bool {
        matches!(
            (self, next),
            (AssetStatus::Pending, AssetStatus::Approved)
                | (AssetStatus::Pending, AssetStatus::Rejected)
                | (AssetStatus::Approved, AssetStatus::Tokenized)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AssetStatus::Rejected | AssetStatus::Tokenized)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssetStatus::Pending),
            "approved" => Ok(AssetStatus::Approved),
            "rejected" => Ok(AssetStatus::Rejected),
            "tokenized" => Ok(AssetStatus::Tokenized),
            other => anyhow::bail!("unknown asset status {other:?}"),
        }
    }
}

/// Token fields filled in by a mint.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTerms {
    pub token_id: String,
    pub symbol: String,
    pub supply: i64,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub asset_type: AssetType,
    pub description: String,
    pub estimated_value: f64,
    pub documents: Vec<String>,
    pub status: AssetStatus,
    pub rejection_reason: Option<String>,
    pub token: Option<TokenTerms>,
    pub is_listed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Asset {
    pub fn is_on_marketplace(&self) -> bool {
        self.status == AssetStatus::Tokenized && self.is_listed
    }
}

#[derive(Debug, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub asset_type: String,
    pub description: String,
    pub estimated_value: f64,
    pub documents: Vec<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub token_id: Option<String>,
    pub token_symbol: Option<String>,
    pub token_supply: Option<i64>,
    pub token_price: Option<f64>,
    pub is_listed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<AssetRow> for Asset {
    type Error = anyhow::Error;

    fn try_from(r: AssetRow) -> Result<Self, Self::Error> {
        let token = match (r.token_id, r.token_symbol, r.token_supply, r.token_price) {
            (Some(token_id), Some(symbol), Some(supply), Some(price)) => Some(TokenTerms {
                token_id,
                symbol,
                supply,
                price,
            }),
            (None, None, None, None) => None,
            _ => anyhow::bail!("asset {} has partial token fields", r.id),
        };
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            asset_type: r.asset_type.parse()?,
            description: r.description,
            estimated_value: r.estimated_value,
            documents: r.documents,
            status: r.status.parse()?,
            rejection_reason: r.rejection_reason,
            token,
            is_listed: r.is_listed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated pledge, ready to insert with status `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub owner_id: Uuid,
    pub asset_type: AssetType,
    pub description: String,
    pub estimated_value: f64,
    pub documents: Vec<String>,
}
