use std::sync::Arc;

use crate::{
    assets::repo::{AssetStore, PgAssetStore},
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
    },
    config::AppConfig,
    db,
    rate_limit::RateLimiter,
    storage::{ObjectStore, S3ObjectStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserStore>,
    pub assets: Arc<dyn AssetStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub limiter: RateLimiter,
}

impl AppState {
    /// Connects to Postgres (running pending migrations) and the object bucket.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        let objects = Arc::new(S3ObjectStore::from_config(&config.storage).await) as Arc<dyn ObjectStore>;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgAssetStore::new(pool)),
            objects,
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        assets: Arc<dyn AssetStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            limiter: RateLimiter::new(&config.rate_limit),
            config: Arc::new(config),
            users,
            assets,
            objects,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over in-memory stores, for tests that never touch a database or bucket.
    pub fn fake() -> Self {
        Self::fake_with(crate::testing::test_config())
    }

    pub fn fake_with(config: AppConfig) -> Self {
        use crate::testing::{MemoryObjectStore, MemoryStore};

        let store = Arc::new(MemoryStore::default());
        Self::from_parts(
            config,
            store.clone(),
            store,
            Arc::new(MemoryObjectStore::default()),
        )
    }
}
