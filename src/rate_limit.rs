//! Per-client fixed-window rate limiting for the `/api` tree.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{config::RateLimitConfig, error::ErrorBody};

const LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the caller's window resets.
    pub reset_in: Duration,
}

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            max_requests: cfg.max_requests.max(1),
            window: Duration::from_secs(cfg.window_secs.max(1)),
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub async fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut windows = self.windows.write().await;
        let w = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(w.started) >= self.window {
            w.started = now;
            w.count = 0;
        }

        let reset_in = self.window.saturating_sub(now.duration_since(w.started));
        if w.count >= self.max_requests {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }
        w.count += 1;
        Decision {
            allowed: true,
            remaining: self.max_requests - w.count,
            reset_in,
        }
    }

    /// Drops windows that have already expired.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        debug!(removed = before - windows.len(), "rate limit windows pruned");
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.windows.read().await.len()
    }
}

fn client_key(connect_info: Option<ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> String {
    connect_info
        .map(|ci| ci.0.ip().to_string())
        .or_else(|| {
            headers
                .get("X-Forwarded-For")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_headers(headers: &mut HeaderMap, limit: u32, d: &Decision) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(d.remaining));
    headers.insert(
        "X-RateLimit-Reset",
        HeaderValue::from(d.reset_in.as_secs().max(1)),
    );
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(connect_info, request.headers());
    let decision = limiter.check(&key).await;

    if !decision.allowed {
        warn!(client = %key, "rate limit exceeded");
        let mut res =
            (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody::new(LIMITED_MESSAGE))).into_response();
        set_headers(res.headers_mut(), limiter.limit(), &decision);
        res.headers_mut().insert(
            "Retry-After",
            HeaderValue::from(decision.reset_in.as_secs().max(1)),
        );
        return res;
    }

    let mut res = next.run(request).await;
    set_headers(res.headers_mut(), limiter.limit(), &decision);
    res
}

pub fn start_cleanup_task(limiter: RateLimiter, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}
