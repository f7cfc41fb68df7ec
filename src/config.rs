use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub static_dir: String,
    pub admin_emails: Vec<String>,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let parse = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a non-negative integer")),
                None => Ok(default),
            }
        };

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let environment = match get("APP_ENV", "development").to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "test" => Environment::Development,
            other => anyhow::bail!("unknown APP_ENV {other:?}"),
        };

        let port = lookup("APP_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "8080".into());
        let port = port
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid port {port:?}"))?;

        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER", "rwa-platform"),
            audience: get("JWT_AUDIENCE", "rwa-platform-users"),
            ttl_minutes: i64::try_from(parse("JWT_TTL_MINUTES", 24 * 60)?)
                .context("JWT_TTL_MINUTES is out of range")?,
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");

        let rate_limit = RateLimitConfig {
            max_requests: u32::try_from(parse("RATE_LIMIT_MAX_REQUESTS", 100)?)
                .context("RATE_LIMIT_MAX_REQUESTS is out of range")?,
            window_secs: parse("RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
        };
        anyhow::ensure!(
            rate_limit.window_secs > 0,
            "RATE_LIMIT_WINDOW_SECS must be positive"
        );

        let storage = StorageConfig {
            endpoint: get("S3_ENDPOINT", "http://localhost:9000"),
            bucket: get("S3_BUCKET", "rwa-documents"),
            access_key: get("S3_ACCESS_KEY", "minioadmin"),
            secret_key: get("S3_SECRET_KEY", "minioadmin"),
            region: get("S3_REGION", "us-east-1"),
        };

        Ok(Self {
            host: get("APP_HOST", "0.0.0.0"),
            port,
            environment,
            database_url,
            database_max_connections: u32::try_from(parse("DATABASE_MAX_CONNECTIONS", 10)?)
                .context("DATABASE_MAX_CONNECTIONS is out of range")?,
            jwt,
            cors_origins: split_list(&get(
                "CORS_ORIGINS",
                "http://localhost:5173,http://localhost:8080",
            ))
            .into_iter()
            .filter(|o| o != "*")
            .collect(),
            body_limit_bytes: usize::try_from(parse("BODY_LIMIT_BYTES", 10 * 1024 * 1024)?)
                .context("BODY_LIMIT_BYTES is out of range")?,
            rate_limit,
            static_dir: get("STATIC_DIR", "dist"),
            admin_emails: split_list(&get("ADMIN_EMAILS", ""))
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            storage,
        })
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
