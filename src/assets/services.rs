use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::{
    assets::{
        dto::{MintRequest, PledgeRequest},
        repo_types::{Asset, AssetType, NewAsset, TokenTerms},
    },
    error::ApiError,
};

pub const DEFAULT_TOKEN_SUPPLY: i64 = 1_000_000;
const MAX_DOCUMENTS: usize = 20;

pub fn validate_pledge(owner_id: Uuid, req: PledgeRequest) -> Result<NewAsset, ApiError> {
    let asset_type = req
        .asset_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Asset type is required"))?;
    let asset_type: AssetType = asset_type.parse().map_err(|_| {
        ApiError::validation(format!(
            "Asset type must be one of: {}",
            AssetType::ALL.map(AssetType::as_str).join(", ")
        ))
    })?;

    let description = req.description.as_deref().unwrap_or("").trim();
    if description.is_empty() {
        return Err(ApiError::validation("Description is required"));
    }

    let estimated_value = req
        .estimated_value
        .ok_or_else(|| ApiError::validation("Estimated value is required"))?;
    if !estimated_value.is_finite() || estimated_value < 0.0 {
        return Err(ApiError::validation(
            "Estimated value must be a non-negative number",
        ));
    }

    let documents: Vec<String> = req
        .documents
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if documents.len() > MAX_DOCUMENTS {
        return Err(ApiError::validation(format!(
            "At most {MAX_DOCUMENTS} documents can be attached"
        )));
    }

    Ok(NewAsset {
        owner_id,
        asset_type,
        description: description.to_string(),
        estimated_value,
        documents,
    })
}

fn is_valid_symbol(symbol: &str) -> bool {
    lazy_static! {
        static ref SYMBOL_RE: Regex = Regex::new(r"^[A-Z0-9]{2,10}$").unwrap();
    }
    SYMBOL_RE.is_match(symbol)
}

/// `0x` followed by 40 random hex digits, shaped like a contract address.
pub fn generate_token_id() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("0x{hex}")
}

/// Price per token in cents precision. Prices too large to scale keep full precision.
pub fn unit_price(estimated_value: f64, supply: i64) -> f64 {
    let price = estimated_value / supply as f64;
    let cents = price * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        price
    }
}

/// Token fields for minting `asset`. Nothing here is backed by a chain.
pub fn token_terms(asset: &Asset, req: &MintRequest) -> Result<TokenTerms, ApiError> {
    let symbol = match req.token_symbol.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_uppercase(),
        _ => asset.asset_type.default_symbol().to_string(),
    };
    if !is_valid_symbol(&symbol) {
        return Err(ApiError::validation(
            "Token symbol must be 2-10 letters or digits",
        ));
    }

    let supply = req.total_supply.unwrap_or(DEFAULT_TOKEN_SUPPLY);
    if supply < 1 {
        return Err(ApiError::validation("Total supply must be at least 1"));
    }

    Ok(TokenTerms {
        token_id: generate_token_id(),
        symbol,
        supply,
        price: unit_price(asset.estimated_value, supply),
    })
}
