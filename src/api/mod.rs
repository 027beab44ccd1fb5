//! Showroom REST API
//!
//! HTTP API layer for the back-office, built with Axum.
//!
//! # Endpoints
//!
//! ## Session
//! - `POST /auth/v1/login` - Open an operator session
//! - `POST /auth/v1/logout` - Close it
//! - `GET /auth/v1/session` - Current session
//!
//! ## Cars (session required)
//! - `GET /api/v1/cars?search&brand&status` - Inventory list
//! - `POST /api/v1/cars` - Create
//! - `GET /api/v1/cars/:id` - Load for editing
//! - `PUT /api/v1/cars/:id` - Save edits
//! - `DELETE /api/v1/cars/:id` - Delete and reload
//! - `POST /api/v1/cars/:id/sold` - Mark sold and reload
//!
//! ## Photos (session required)
//! - `POST /api/v1/photos` - Upload a batch (multipart)
//! - `POST /api/v1/photos/remove` - Remove one photo by index
//!
//! ## Leads (session required)
//! - `GET /api/v1/leads?name&car&phone&order` - Lead list
//! - `GET /api/v1/leads/:id` - Lead detail
//! - `PATCH /api/v1/leads/:id/financing` - Financing status
//!
//! ## Dashboard (session required)
//! - `GET /api/v1/dashboard`
//!
//! ## Realtime
//! - `GET /api/v1/ws` - Change stream (websocket)
//!
//! ## Sync Function
//! - `POST|OPTIONS /functions/v1/sync-agent` - Forward to the agent webhook
//!
//! ## Storage
//! - `GET /storage/v1/object/public/<bucket>/<key>` - Public photo URLs
//!
//! ## Health
//! - `GET /health/live`, `GET /health/ready`, `GET /health`
//!
//! # Example
//!
//! ```rust,ignore
//! use showroom::api::{serve, AppState};
//! use showroom::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let state = AppState::open(config).await?;
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{any, get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::realtime::websocket_handler;
use crate::storage::{ObjectStore, PUBLIC_OBJECT_PATH};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/session", get(routes::auth::current_session));

    let api_routes = Router::new()
        // Cars
        .route(
            "/cars",
            get(routes::cars::list_cars).post(routes::cars::create_car),
        )
        .route(
            "/cars/:id",
            get(routes::cars::get_car)
                .put(routes::cars::update_car)
                .delete(routes::cars::delete_car),
        )
        .route("/cars/:id/sold", post(routes::cars::mark_sold))
        // Photos
        .route(
            "/photos",
            // Size is checked per file while the parts are read
            post(routes::photos::upload_photos).layer(DefaultBodyLimit::disable()),
        )
        .route("/photos/remove", post(routes::photos::remove_photo))
        // Leads
        .route("/leads", get(routes::leads::list_leads))
        .route("/leads/:id", get(routes::leads::get_lead))
        .route("/leads/:id/financing", patch(routes::leads::update_financing))
        // Dashboard
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        // Realtime
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let public_photos = format!("{}/{}", PUBLIC_OBJECT_PATH, state.bucket.bucket());

    // The Sync Function sets its own CORS headers and stays outside the layer
    let functions_routes =
        Router::new().route("/functions/v1/sync-agent", any(routes::functions::sync_agent));

    let timeout = Duration::from_secs(state.config.api.request_timeout_secs.max(1));
    let cors = cors_layer(&state.config.api.cors_origins);
    let bucket_root = state.bucket.root().to_path_buf();

    Router::new()
        .nest("/auth/v1", auth_routes)
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .nest_service(&public_photos, ServeDir::new(bucket_root))
        .layer(cors)
        .merge(functions_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(Arc::new(state))
}

/// Permissive when no origins are configured or `*` is listed
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.api.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Showroom API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Showroom API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
