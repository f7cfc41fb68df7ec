use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    assets::{
        dto::{AssetListResponse, AssetResponse, ListingRequest, MintRequest, PledgeRequest},
        repo_types::AssetStatus,
        services::{token_terms, validate_pledge},
    },
    auth::jwt::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    marketplace::handlers::list_listings,
    state::AppState,
};

pub fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/assets/pledge", post(pledge_asset))
        .route("/assets/mine", get(list_my_assets))
        .route("/assets/marketplace", get(list_listings))
        .route("/assets/:id", get(get_asset))
        .route("/assets/:id/mint", post(mint_asset))
        .route("/assets/:id/listing", post(set_listing))
}

#[instrument(skip(state, payload))]
pub async fn pledge_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<PledgeRequest>,
) -> Result<(StatusCode, Json<AssetResponse>), ApiError> {
    let new = validate_pledge(user_id, payload)?;
    let asset = state.assets.insert(new).await?;

    info!(%user_id, asset_id = %asset.id, asset_type = %asset.asset_type, "asset pledged");
    Ok((
        StatusCode::CREATED,
        Json(AssetResponse {
            success: true,
            message: "Asset pledged successfully".into(),
            asset: asset.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_my_assets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AssetListResponse>, ApiError> {
    let assets = state.assets.list_by_owner(user_id).await?;
    Ok(Json(AssetListResponse::new(assets)))
}

#[instrument(skip(state))]
pub async fn get_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AssetResponse>, ApiError> {
    let asset = state
        .assets
        .find_owned(user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    Ok(Json(AssetResponse {
        success: true,
        message: "Asset found".into(),
        asset: asset.into(),
    }))
}

/// POST /assets/:id/mint, body optional: { tokenSymbol?, totalSupply? }
#[instrument(skip(state, body))]
pub async fn mint_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AssetResponse>, ApiError> {
    let body = body?;
    let req: MintRequest = if body.iter().all(u8::is_ascii_whitespace) {
        MintRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid mint request: {e}")))?
    };

    let asset = state
        .assets
        .find_owned(user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    if !asset.status.can_transition_to(AssetStatus::Tokenized) {
        warn!(asset_id = %id, status = %asset.status, "mint refused");
        return Err(ApiError::conflict(format!(
            "Asset must be approved before minting (current status: {})",
            asset.status
        )));
    }

    let terms = token_terms(&asset, &req)?;
    let minted = state
        .assets
        .mint(user_id, id, &terms)
        .await?
        .ok_or_else(|| ApiError::conflict("Asset is no longer approved for minting"))?;

    info!(
        %user_id,
        asset_id = %id,
        token_id = %terms.token_id,
        symbol = %terms.symbol,
        token_name = req.token_name.as_deref(),
        supply = terms.supply,
        "asset tokenized"
    );
    Ok(Json(AssetResponse {
        success: true,
        message: "Tokens minted successfully".into(),
        asset: minted.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn set_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ListingRequest>,
) -> Result<Json<AssetResponse>, ApiError> {
    let asset = state
        .assets
        .find_owned(user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    if asset.status != AssetStatus::Tokenized {
        return Err(ApiError::conflict("Only tokenized assets can be listed"));
    }

    let updated = state
        .assets
        .set_listed(user_id, id, payload.is_listed)
        .await?
        .ok_or_else(|| ApiError::conflict("Only tokenized assets can be listed"))?;

    info!(%user_id, asset_id = %id, listed = payload.is_listed, "asset listing changed");
    let message = if updated.is_listed {
        "Asset listed on marketplace"
    } else {
        "Asset removed from marketplace"
    };
    Ok(Json(AssetResponse {
        success: true,
        message: message.into(),
        asset: updated.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn pledge_stores_pending_asset() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;

        let (status, body) = app.pledge(&token, 250_000.0).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["asset"]["status"], "pending");
        assert_eq!(body["asset"]["estimatedValue"], 250_000.0);
        assert_eq!(body["asset"]["isListed"], false);
        assert!(body["asset"].get("tokenId").is_none());

        let (status, body) = app.get("/api/assets/mine", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assets"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_value_is_accepted_negative_is_rejected() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;

        let (status, _) = app.pledge(&token, 0.0).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app.pledge(&token, -1.0).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Estimated value must be a non-negative number");
    }

    #[tokio::test]
    async fn pledge_requires_authentication() {
        let app = TestApp::new();
        let (status, _) = app
            .post(
                "/api/assets/pledge",
                None,
                json!({"assetType": "art", "description": "x", "estimatedValue": 1}),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mint_requires_approval_and_happens_once() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;
        let (_, body) = app.pledge(&token, 1_000_000.0).await;
        let id = body["asset"]["id"].as_str().unwrap().to_string();
        let mint_uri = format!("/api/assets/{id}/mint");

        let (status, body) = app.post(&mint_uri, Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("pending"));

        app.approve(&id).await;

        let (status, body) = app
            .post(&mint_uri, Some(&token), json!({"tokenSymbol": "lsbn", "totalSupply": 1000}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let minted = &body["asset"];
        assert_eq!(minted["status"], "tokenized");
        assert_eq!(minted["tokenSymbol"], "LSBN");
        assert_eq!(minted["tokenSupply"], 1000);
        assert_eq!(minted["tokenPrice"], 1000.0);
        let token_id = minted["tokenId"].as_str().unwrap().to_string();

        let (status, _) = app.post(&mint_uri, Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = app.get(&format!("/api/assets/{id}"), Some(&token)).await;
        assert_eq!(body["asset"]["tokenId"], token_id.as_str());
        assert_eq!(body["asset"]["tokenSymbol"], "LSBN");
    }

    #[tokio::test]
    async fn mint_accepts_an_empty_body() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;
        let id = app.approved_asset(&token, 500.0).await;

        let (status, body) = app
            .raw("POST", &format!("/api/assets/{id}/mint"), Some(&token), "application/json", String::new())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"]["tokenSymbol"], "RE");
        assert_eq!(body["asset"]["tokenSupply"], 1_000_000);
    }

    #[tokio::test]
    async fn oversized_mint_body_keeps_the_envelope() {
        let mut config = crate::testing::test_config();
        config.body_limit_bytes = 1024;
        let app = TestApp::with_config(config);
        let token = app.signup("Jane", "jane@x.com").await;
        let id = app.approved_asset(&token, 500.0).await;

        let (status, body) = app
            .post(
                &format!("/api/assets/{id}/mint"),
                Some(&token),
                json!({"tokenName": "x".repeat(4096)}),
            )
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Request body is too large");
    }

    #[tokio::test]
    async fn mint_of_a_huge_value_has_a_finite_price() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;
        let id = app.approved_asset(&token, f64::MAX).await;

        let (status, body) = app
            .post(&format!("/api/assets/{id}/mint"), Some(&token), json!({"totalSupply": 1}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"]["tokenPrice"], f64::MAX);
    }

    #[tokio::test]
    async fn assets_are_owner_scoped() {
        let app = TestApp::new();
        let jane = app.signup("Jane", "jane@x.com").await;
        let john = app.signup("John", "john@x.com").await;
        let id = app.approved_asset(&jane, 10.0).await;

        let (status, _) = app.get(&format!("/api/assets/{id}"), Some(&john)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post(&format!("/api/assets/{id}/mint"), Some(&john), json!({}))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.get("/api/assets/mine", Some(&john)).await;
        assert!(body["assets"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_tokenized_assets_can_be_listed() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;
        let id = app.approved_asset(&token, 10.0).await;
        let listing_uri = format!("/api/assets/{id}/listing");

        let (status, _) = app
            .post(&listing_uri, Some(&token), json!({"isListed": true}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        app.post(&format!("/api/assets/{id}/mint"), Some(&token), json!({}))
            .await;
        let (status, body) = app
            .post(&listing_uri, Some(&token), json!({"isListed": true}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"]["isListed"], true);
    }

    #[tokio::test]
    async fn malformed_asset_id_is_a_400() {
        let app = TestApp::new();
        let token = app.signup("Jane", "jane@x.com").await;
        let (status, body) = app.get("/api/assets/not-a-uuid", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid identifier");
    }
}
