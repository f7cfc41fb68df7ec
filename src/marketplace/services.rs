use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
    assets::repo_types::{Asset, AssetType, TokenTerms},
    error::ApiError,
    marketplace::dto::SummaryResponse,
};

pub fn new_transaction_id() -> String {
    format!("tx_{}", Uuid::new_v4().simple())
}

/// Aggregate over marketplace-visible assets; anything else is ignored.
pub fn summarize(assets: &[Asset]) -> SummaryResponse {
    let mut by_type: BTreeMap<&'static str, usize> =
        AssetType::ALL.iter().map(|t| (t.as_str(), 0)).collect();
    let mut total_value = 0.0;
    let mut total_token_supply: i64 = 0;
    let mut total_listings = 0;

    for asset in assets.iter().filter(|a| a.is_on_marketplace()) {
        total_listings += 1;
        total_value += asset.estimated_value;
        total_token_supply =
            total_token_supply.saturating_add(asset.token.as_ref().map_or(0, |t| t.supply));
        *by_type.entry(asset.asset_type.as_str()).or_default() += 1;
    }

    SummaryResponse {
        success: true,
        total_listings,
        total_value,
        total_token_supply,
        by_type,
    }
}

pub fn require_token_id(token_id: Option<String>) -> Result<String, ApiError> {
    token_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Token id is required"))
}

/// Whole tokens, at least one, never more than were minted.
pub fn check_amount(amount: Option<i64>, terms: &TokenTerms) -> Result<i64, ApiError> {
    let amount = amount.ok_or_else(|| ApiError::validation("Amount is required"))?;
    if amount < 1 {
        return Err(ApiError::validation("Amount must be at least 1"));
    }
    if amount > terms.supply {
        return Err(ApiError::validation(format!(
            "Amount exceeds total supply of {}",
            terms.supply
        )));
    }
    Ok(amount)
}

pub fn check_price(price: Option<f64>) -> Result<f64, ApiError> {
    let price = price.ok_or_else(|| ApiError::validation("Price is required"))?;
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("Price must be a non-negative number"));
    }
    Ok(price)
}

pub fn order_total(price: f64, amount: i64) -> f64 {
    (price * amount as f64 * 100.0).round() / 100.0
}
