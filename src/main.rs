//! Breakwater Design - Rust/Axum Frontend
//!
//! Web form for conceptual breakwater design. All engineering calculations
//! run in an external service; this application collects and validates the
//! inputs, assembles the design request and renders the results.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
pub mod design;
mod error;
mod routes;
mod sessions;

use config::AppConfig;
use design::{EngineeringService, HttpEngineeringService};
use sessions::SessionStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub engineering: Arc<dyn EngineeringService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breakwater_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let engineering =
        HttpEngineeringService::new(&config.engineering_service_url, config.design_timeout)?;
    tracing::info!(
        "Engineering service at {} (timeout {:?})",
        engineering.base_url(),
        config.design_timeout
    );
    let sessions = SessionStore::new(config.session_capacity, config.session_ttl);
    let addr = config.bind_addr.clone();

    let state = AppState {
        config: Arc::new(config),
        sessions,
        engineering: Arc::new(engineering),
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Health check and session stats
        .route("/health", get(health_check))
        .route("/health/sessions", get(session_stats))
        // Design form
        .route("/", get(routes::form::index))
        .route("/type", post(routes::form::select_type))
        .route("/design", post(routes::form::design))
        // Design API
        .nest("/api/design", design::router())
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        // State and middleware
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "engineering_service": state.config.engineering_service_url,
        "service": "rust-frontend"
    }))
}

/// Session statistics endpoint
async fn session_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sessions.stats())
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::design::service::fake::FakeService;
    use crate::test_support::state_with;

    #[tokio::test]
    async fn test_health_reports_service_url() {
        let app = app(state_with(Arc::new(FakeService::new())));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["engineering_service"], "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_session_stats() {
        let app = app(state_with(Arc::new(FakeService::new())));
        let response = app
            .oneshot(Request::get("/health/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["capacity"], 100);
        assert_eq!(json["idle_timeout_secs"], 60);
    }
}
