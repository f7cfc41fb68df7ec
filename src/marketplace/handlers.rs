use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    assets::{
        dto::AssetListResponse,
        repo_types::{Asset, TokenTerms},
    },
    auth::jwt::AuthUser,
    error::ApiError,
    extract::ApiJson,
    marketplace::{
        dto::{BuyRequest, SellRequest, Side, SummaryResponse, TradeResponse},
        services::{
            check_amount, check_price, new_transaction_id, order_total, require_token_id,
            summarize,
        },
    },
    state::AppState,
};

pub fn marketplace_routes() -> Router<AppState> {
    Router::new()
        .route("/marketplace/listings", get(list_listings))
        .route("/marketplace/summary", get(get_summary))
        .route("/marketplace/buy", post(buy_tokens))
        .route("/marketplace/sell", post(sell_tokens))
}

/// Public: tokenized and listed assets of every owner.
#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
) -> Result<Json<AssetListResponse>, ApiError> {
    let assets = state.assets.list_marketplace().await?;
    Ok(Json(AssetListResponse::new(assets)))
}

#[instrument(skip(state))]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let assets = state.assets.list_marketplace().await?;
    Ok(Json(summarize(&assets)))
}

async fn listed_token(state: &AppState, token_id: Option<String>) -> Result<Asset, ApiError> {
    let token_id = require_token_id(token_id)?;
    state
        .assets
        .find_listed_by_token(&token_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Token not listed on marketplace"))
}

fn trade(side: Side, terms: &TokenTerms, amount: i64, price: f64) -> TradeResponse {
    let message = match side {
        Side::Buy => "Purchase order placed",
        Side::Sell => "Sell order placed",
    };
    TradeResponse {
        success: true,
        message: message.into(),
        transaction_id: new_transaction_id(),
        side,
        token_id: terms.token_id.clone(),
        token_symbol: terms.symbol.clone(),
        amount,
        price,
        total: order_total(price, amount),
    }
}

#[instrument(skip(state, payload))]
pub async fn buy_tokens(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<BuyRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let asset = listed_token(&state, payload.token_id).await?;
    let Some(terms) = asset.token.as_ref() else {
        return Err(ApiError::not_found("Token not listed on marketplace"));
    };
    let amount = check_amount(payload.amount, terms)?;
    let res = trade(Side::Buy, terms, amount, terms.price);

    info!(%user_id, token_id = %res.token_id, amount, tx = %res.transaction_id, "buy simulated");
    Ok(Json(res))
}

#[instrument(skip(state, payload))]
pub async fn sell_tokens(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<SellRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let asset = listed_token(&state, payload.token_id).await?;
    let Some(terms) = asset.token.as_ref() else {
        return Err(ApiError::not_found("Token not listed on marketplace"));
    };
    let amount = check_amount(payload.amount, terms)?;
    let price = check_price(payload.price)?;
    let res = trade(Side::Sell, terms, amount, price);

    info!(%user_id, token_id = %res.token_id, amount, price, tx = %res.transaction_id, "sell simulated");
    Ok(Json(res))
}
