//! HTTP API gateway for the Mini-Jira admin agent.
//!
//! Two ways in:
//!
//! - natural language: `POST /api/chat` runs one Dispatcher turn against a
//!   caller-owned history;
//! - direct structured CRUD under `/api/users`, `/api/tickets` and
//!   `/api/reset`, which bypasses the model and calls the store.
//!
//! Built on Axum. The server keeps no session state.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use minijira_agent::Dispatcher;
use minijira_config::AppConfig;
use minijira_core::store::TicketStore;
use minijira_store::SqliteStore;

/// Shared application state for the gateway.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn TicketStore>,
}

pub type SharedState = Arc<AppState>;

/// Build the full router.
///
/// Layers applied:
/// - CORS limited to `allowed_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors_layer(allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Opens the store at the configured path (creating and migrating it if
/// needed), wires provider, tools and dispatcher once, and serves until the
/// process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = minijira_providers::build_from_config(&config)?;
    let store: Arc<dyn TicketStore> = Arc::new(SqliteStore::new(&config.store.path).await?);
    let tools = Arc::new(minijira_tools::default_registry(store.clone()));
    let dispatcher = Dispatcher::from_config(&config, provider, tools);

    let state = Arc::new(AppState { dispatcher, store });
    let app = build_router(state, &config.gateway.allowed_origins);

    info!(
        addr = %addr,
        provider = %config.provider,
        model = %config.model,
        db = %config.store.path.display(),
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use minijira_agent::IntentClassifier;
    use minijira_agent::testing::ScriptedProvider;
    use tower::ServiceExt;

    async fn test_state() -> SharedState {
        let store: Arc<dyn TicketStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let tools = Arc::new(minijira_tools::default_registry(store.clone()));
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let dispatcher = Dispatcher::new(IntentClassifier::new(provider, "scripted"), tools);
        Arc::new(AppState { dispatcher, store })
    }

    fn origins() -> Vec<String> {
        vec!["http://localhost:5173".to_string()]
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state().await, &origins());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let app = build_router(test_state().await, &origins());

        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/api/users")
                .header("Origin", origin)
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app
            .clone()
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );

        let denied = app.oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn invalid_origins_are_skipped() {
        let app = build_router(
            test_state().await,
            &["not a header\n".to_string(), "http://127.0.0.1:5174".to_string()],
        );
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(test_state().await, &origins());
        let req = Request::builder()
            .uri("/v1/chat")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);
    }
}
