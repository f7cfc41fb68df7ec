use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub token_id: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub token_id: Option<String>,
    pub amount: Option<i64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Echo of a simulated order. Nothing is settled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
    pub side: Side,
    pub token_id: String,
    pub token_symbol: String,
    pub amount: i64,
    pub price: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub success: bool,
    pub total_listings: usize,
    pub total_value: f64,
    pub total_token_supply: i64,
    pub by_type: BTreeMap<&'static str, usize>,
}
