use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    extract::ApiJson,
    liquidity::pools::{
        find_pool, Action, LiquidityRequest, LiquidityResponse, PoolsResponse, POOLS,
    },
    marketplace::services::new_transaction_id,
    state::AppState,
};

pub fn liquidity_routes() -> Router<AppState> {
    Router::new()
        .route("/liquidity/pools", get(list_pools))
        .route("/liquidity/provide", post(provide))
        .route("/liquidity/withdraw", post(withdraw))
}

pub async fn list_pools() -> Json<PoolsResponse> {
    Json(PoolsResponse {
        success: true,
        pools: &POOLS,
    })
}

fn simulate(
    user_id: Uuid,
    action: Action,
    req: LiquidityRequest,
) -> Result<LiquidityResponse, ApiError> {
    let pool_id = req
        .pool_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Pool id is required"))?;
    let pool = find_pool(pool_id).ok_or_else(|| ApiError::not_found("Pool not found"))?;

    let amount = req
        .amount
        .ok_or_else(|| ApiError::validation("Amount is required"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::validation("Amount must be a positive number"));
    }

    let message = match action {
        Action::Provide => "Liquidity provided successfully",
        Action::Withdraw => "Liquidity withdrawn successfully",
    };
    let res = LiquidityResponse {
        success: true,
        message: message.into(),
        transaction_id: new_transaction_id(),
        action,
        pool_id: pool.id,
        currency: pool.currency,
        amount,
        lp_tokens: amount,
    };
    info!(%user_id, pool = pool.id, amount, ?action, tx = %res.transaction_id, "liquidity simulated");
    Ok(res)
}

#[instrument(skip(payload))]
pub async fn provide(
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<LiquidityRequest>,
) -> Result<Json<LiquidityResponse>, ApiError> {
    simulate(user_id, Action::Provide, payload).map(Json)
}

#[instrument(skip(payload))]
pub async fn withdraw(
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<LiquidityRequest>,
) -> Result<Json<LiquidityResponse>, ApiError> {
    simulate(user_id, Action::Withdraw, payload).map(Json)
}
