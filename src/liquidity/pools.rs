use serde::{Deserialize, Serialize};

/// A placeholder pool. Figures are static; nothing moves when users provide or withdraw.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: &'static str,
    pub name: &'static str,
    pub currency: &'static str,
    pub apr: f64,
    pub total_liquidity: f64,
    pub available_liquidity: f64,
    /// Percent of the borrowed amount that must be posted as collateral.
    pub collateral_requirement: u32,
}

pub static POOLS: [Pool; 3] = [
    Pool {
        id: "usdc-real-estate",
        name: "USDC Real Estate Pool",
        currency: "USDC",
        apr: 8.5,
        total_liquidity: 2_500_000.0,
        available_liquidity: 1_250_000.0,
        collateral_requirement: 150,
    },
    Pool {
        id: "usdt-commodities",
        name: "USDT Commodities Pool",
        currency: "USDT",
        apr: 6.2,
        total_liquidity: 1_800_000.0,
        available_liquidity: 950_000.0,
        collateral_requirement: 175,
    },
    Pool {
        id: "dai-art",
        name: "DAI Art & Collectibles Pool",
        currency: "DAI",
        apr: 11.4,
        total_liquidity: 600_000.0,
        available_liquidity: 220_000.0,
        collateral_requirement: 200,
    },
];

pub fn find_pool(id: &str) -> Option<&'static Pool> {
    POOLS.iter().find(|p| p.id == id)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRequest {
    pub pool_id: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Provide,
    Withdraw,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolsResponse {
    pub success: bool,
    pub pools: &'static [Pool],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
    pub action: Action,
    pub pool_id: &'static str,
    pub currency: &'static str,
    pub amount: f64,
    pub lp_tokens: f64,
}
