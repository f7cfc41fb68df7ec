//! In-memory stores and a router harness shared by the handler tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    assets::{
        repo::AssetStore,
        repo_types::{Asset, AssetStatus, NewAsset, TokenTerms},
    },
    auth::{
        repo::UserStore,
        repo_types::{KycStatus, NewUser, User},
    },
    config::{AppConfig, Environment, JwtConfig, RateLimitConfig, StorageConfig},
    db::{StoreError, StoreResult},
    state::AppState,
    storage::ObjectStore,
};

pub const PASSWORD: &str = "Passw0rd";
pub const ADMIN_EMAIL: &str = "admin@example.com";

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        environment: Environment::Development,
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "rwa-platform".into(),
            audience: "rwa-platform-users".into(),
            ttl_minutes: 24 * 60,
        },
        cors_origins: vec!["http://localhost:5173".into()],
        body_limit_bytes: 1024 * 1024,
        rate_limit: RateLimitConfig {
            max_requests: 10_000,
            window_secs: 900,
        },
        static_dir: "tests/static-missing".into(),
        admin_emails: vec![ADMIN_EMAIL.into()],
        storage: StorageConfig {
            endpoint: "http://objects.test".into(),
            bucket: "test".into(),
            access_key: "test".into(),
            secret_key: "test".into(),
            region: "us-east-1".into(),
        },
    }
}

/// Users and assets kept in process, with the same conditional-write rules as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    assets: Mutex<Vec<Asset>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            kyc_status: KycStatus::Pending,
            kyc_documents: vec![],
            kyc_submitted_at: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list_by_kyc_status(&self, status: KycStatus) -> StoreResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.kyc_status == status).cloned().collect())
    }

    async fn submit_kyc(&self, id: Uuid, documents: &[String]) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(u) = users
            .iter_mut()
            .find(|u| u.id == id && u.kyc_status != KycStatus::Approved)
        else {
            return Ok(None);
        };
        let now = OffsetDateTime::now_utc();
        u.kyc_status = KycStatus::Pending;
        u.kyc_documents.extend_from_slice(documents);
        u.kyc_submitted_at = Some(now);
        u.updated_at = now;
        Ok(Some(u.clone()))
    }

    async fn set_kyc_status(&self, id: Uuid, status: KycStatus) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.kyc_status = status;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }
}

impl MemoryStore {
    fn update_asset(&self, pred: impl Fn(&Asset) -> bool, f: impl FnOnce(&mut Asset)) -> Option<Asset> {
        let mut assets = self.assets.lock().unwrap();
        let a = assets.iter_mut().find(|a| pred(a))?;
        f(a);
        a.updated_at = OffsetDateTime::now_utc();
        Some(a.clone())
    }

    fn select(&self, pred: impl Fn(&Asset) -> bool) -> Vec<Asset> {
        // newest insert first, so equal timestamps still sort newest first
        let assets = self.assets.lock().unwrap();
        assets.iter().rev().filter(|a| pred(a)).cloned().collect()
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn insert(&self, new: NewAsset) -> StoreResult<Asset> {
        let now = OffsetDateTime::now_utc();
        let asset = Asset {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            asset_type: new.asset_type,
            description: new.description,
            estimated_value: new.estimated_value,
            documents: new.documents,
            status: AssetStatus::Pending,
            rejection_reason: None,
            token: None,
            is_listed: false,
            created_at: now,
            updated_at: now,
        };
        self.assets.lock().unwrap().push(asset.clone());
        Ok(asset)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>> {
        Ok(self.select(|a| a.id == id).pop())
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Asset>> {
        Ok(self.select(|a| a.id == id && a.owner_id == owner_id).pop())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Asset>> {
        let mut assets = self.select(|a| a.owner_id == owner_id);
        assets.sort_by(|x, y| y.created_at.cmp(&x.created_at));
        Ok(assets)
    }

    async fn list_by_status(&self, status: AssetStatus) -> StoreResult<Vec<Asset>> {
        let mut assets = self.select(|a| a.status == status);
        assets.reverse();
        Ok(assets)
    }

    async fn list_marketplace(&self) -> StoreResult<Vec<Asset>> {
        Ok(self.select(Asset::is_on_marketplace))
    }

    async fn find_listed_by_token(&self, token_id: &str) -> StoreResult<Option<Asset>> {
        Ok(self
            .select(|a| {
                a.is_on_marketplace() && a.token.as_ref().is_some_and(|t| t.token_id == token_id)
            })
            .pop())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
        rejection_reason: Option<String>,
    ) -> StoreResult<Option<Asset>> {
        Ok(self.update_asset(
            |a| a.id == id && a.status == from,
            |a| {
                a.status = to;
                if rejection_reason.is_some() {
                    a.rejection_reason = rejection_reason;
                }
            },
        ))
    }

    async fn mint(&self, owner_id: Uuid, id: Uuid, terms: &TokenTerms) -> StoreResult<Option<Asset>> {
        let taken = self
            .select(|a| a.token.as_ref().is_some_and(|t| t.token_id == terms.token_id))
            .len();
        if taken > 0 {
            return Err(StoreError::Duplicate("token id"));
        }
        Ok(self.update_asset(
            |a| a.id == id && a.owner_id == owner_id && a.status == AssetStatus::Approved,
            |a| {
                a.status = AssetStatus::Tokenized;
                a.token = Some(terms.clone());
            },
        ))
    }

    async fn set_listed(&self, owner_id: Uuid, id: Uuid, listed: bool) -> StoreResult<Option<Asset>> {
        Ok(self.update_asset(
            |a| a.id == id && a.owner_id == owner_id && a.status == AssetStatus::Tokenized,
            |a| a.is_listed = listed,
        ))
    }
}

/// Bucket stand-in that remembers what was put.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        Ok(format!(
            "https://objects.test/{key}?expires={}",
            expires_in.as_secs()
        ))
    }
}

/// A listed token created through the public endpoints.
pub struct Listed {
    pub id: String,
    pub token_id: String,
}

/// The full router over in-memory state, driven with `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub objects: Arc<MemoryObjectStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let objects = Arc::new(MemoryObjectStore::default());
        let state = AppState::from_parts(config, store.clone(), store, objects.clone());
        Self {
            router: build_app(state.clone()),
            state,
            objects,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.send(req).await;
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: String,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        self.call(req.body(Body::from(body)).unwrap()).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.call(req.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn register(&self, name: &str, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/register",
            None,
            json!({"name": name, "email": email, "password": PASSWORD}),
        )
        .await
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers and logs in.
    pub async fn signup(&self, name: &str, email: &str) -> String {
        let (status, body) = self.register(name, email).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        self.login(email).await
    }

    pub async fn admin_token(&self) -> String {
        // a second call finds the account already there
        self.register("Admin", ADMIN_EMAIL).await;
        self.login(ADMIN_EMAIL).await
    }

    pub async fn set_kyc(&self, email: &str, status: &str) {
        let user = self.state.users.find_by_email(email).await.unwrap().unwrap();
        self.state
            .users
            .set_kyc_status(user.id, status.parse().unwrap())
            .await
            .unwrap();
    }

    pub async fn pledge(&self, token: &str, value: f64) -> (StatusCode, Value) {
        self.post(
            "/api/assets/pledge",
            Some(token),
            json!({
                "assetType": "real_estate",
                "description": "Apartment in Lisbon",
                "estimatedValue": value,
                "documents": ["deed.pdf"],
            }),
        )
        .await
    }

    pub async fn approve(&self, asset_id: &str) {
        let admin = self.admin_token().await;
        let (status, body) = self
            .post(
                &format!("/api/admin/assets/{asset_id}/approve"),
                Some(&admin),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {body}");
    }

    pub async fn approved_asset(&self, token: &str, value: f64) -> String {
        let (status, body) = self.pledge(token, value).await;
        assert_eq!(status, StatusCode::CREATED, "pledge failed: {body}");
        let id = body["asset"]["id"].as_str().unwrap().to_string();
        self.approve(&id).await;
        id
    }

    pub async fn tokenized_asset(&self, token: &str, value: f64) -> String {
        let id = self.approved_asset(token, value).await;
        let (status, body) = self
            .post(&format!("/api/assets/{id}/mint"), Some(token), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "mint failed: {body}");
        id
    }

    pub async fn listed_token(&self, token: &str, value: f64) -> Listed {
        let id = self.tokenized_asset(token, value).await;
        let (status, body) = self
            .post(
                &format!("/api/assets/{id}/listing"),
                Some(token),
                json!({"isListed": true}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "listing failed: {body}");
        Listed {
            id,
            token_id: body["asset"]["tokenId"].as_str().unwrap().to_string(),
        }
    }
}
