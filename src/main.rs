use std::time::Duration;

mod activity;
mod admin;
mod app;
mod assets;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod kyc;
mod liquidity;
mod marketplace;
mod rate_limit;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "rwa_platform=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.admin_emails.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; admin endpoints will refuse everyone");
    }

    let state = AppState::init(config).await?;
    rate_limit::start_cleanup_task(
        state.limiter.clone(),
        Duration::from_secs(state.config.rate_limit.window_secs),
    );

    let config = state.config.clone();
    let app = app::build_app(state);
    app::serve(app, &config).await
}
