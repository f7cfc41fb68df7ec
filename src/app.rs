use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    activity, admin, assets, auth,
    config::AppConfig,
    error::{attach_error_detail, ErrorBody},
    kyc, liquidity, marketplace,
    rate_limit::rate_limit,
    state::AppState,
};

// helmet defaults, minus CSP and COEP which break the bundled SPA
const SECURITY_HEADERS: [(&str, &str); 9] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("x-dns-prefetch-control", "off"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

#[derive(Serialize)]
struct Health {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: OffsetDateTime::now_utc(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn api_not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Endpoint not found")))
}

async fn api_method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method not allowed")),
    )
}

fn cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS.iter().fold(router, |r, &(name, value)| {
        r.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(kyc::router())
        .merge(assets::router())
        .merge(marketplace::router())
        .merge(liquidity::router())
        .merge(activity::router())
        .merge(admin::router())
        .method_not_allowed_fallback(api_method_not_allowed)
        .fallback(api_not_found)
        .layer(from_fn_with_state(state.limiter.clone(), rate_limit));

    let static_dir = Path::new(&state.config.static_dir);
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let router = Router::new()
        .nest("/api", api)
        .fallback_service(spa)
        .layer(from_fn_with_state(state.clone(), attach_error_detail))
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .with_state(state.clone());

    with_security_headers(router)
        .layer(cors(&state.config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    info!(%addr, env = ?config.environment, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    use crate::testing::{test_config, TestApp};

    #[tokio::test]
    async fn health_reports_ok() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_api_routes_get_a_json_404() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/does/not/exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "Endpoint not found"}));
    }

    #[tokio::test]
    async fn wrong_method_gets_a_json_405() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/auth/register", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"success": false, "message": "Method not allowed"}));
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let app = TestApp::new();
        let res = app
            .send(Request::get("/api/health").body(Body::empty()).unwrap())
            .await;
        let h = res.headers();
        assert_eq!(h["x-content-type-options"], "nosniff");
        assert_eq!(h["x-frame-options"], "SAMEORIGIN");
        assert!(h.contains_key("strict-transport-security"));
        assert!(!h.contains_key("content-security-policy"));
        assert!(h.contains_key("x-ratelimit-limit"));
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_with_credentials() {
        let app = TestApp::new();
        let res = app
            .send(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/login")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        let h = res.headers();
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let res = app
            .send(
                Request::get("/api/health")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert!(!res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn api_is_rate_limited_per_client() {
        let mut config = test_config();
        config.rate_limit.max_requests = 2;
        let app = TestApp::with_config(config);

        let hit = |ip: &'static str| {
            Request::get("/api/health")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(app.send(hit("10.0.0.1")).await.status(), StatusCode::OK);
        assert_eq!(app.send(hit("10.0.0.1")).await.status(), StatusCode::OK);

        let res = app.send(hit("10.0.0.1")).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
        assert!(res.headers().contains_key("retry-after"));
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body["message"],
            "Too many requests from this IP, please try again later."
        );

        assert_eq!(app.send(hit("10.0.0.2")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let mut config = test_config();
        config.body_limit_bytes = 1024;
        let app = TestApp::with_config(config);

        let big = json!({"email": "a".repeat(4096), "password": "x"});
        let (status, body) = app.post("/api/auth/login", None, big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_api_paths_fall_back_to_the_spa() {
        let dir = std::env::temp_dir().join(format!("rwa-spa-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<!doctype html><div id=root></div>").unwrap();
        std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();

        let mut config = test_config();
        config.static_dir = dir.to_string_lossy().into_owned();
        let app = TestApp::with_config(config);

        for (uri, expected) in [
            ("/", "<!doctype html>"),
            ("/dashboard/assets", "<!doctype html>"),
            ("/app.js", "console.log"),
        ] {
            let res = app
                .send(Request::get(uri).body(Body::empty()).unwrap())
                .await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert!(String::from_utf8_lossy(&body).starts_with(expected), "{uri}");
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
