//! retoots - Authorization-gated gateway for Mastodon status interactions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - descendants / favourited_by / boosted_by / interactions  │
//! │  - metrics                                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Root-author authorization (LRU decision cache)           │
//! │  - Interaction aggregation                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Mastodon Layer                           │
//! │  - Status reference normalization                           │
//! │  - Remote Mastodon REST client (reqwest)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Authorization gate and aggregation
//! - `mastodon`: Reference parsing and remote API access
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod config;
pub mod error;
pub mod mastodon;
pub mod metrics;
pub mod service;

use std::sync::Arc;

use mastodon::MastodonClient;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Root-author allow-list check with decision cache
    pub authorization: Arc<service::AuthorizationGate>,

    /// Fan-out to the remote server
    pub interactions: Arc<service::InteractionService>,
}

impl AppState {
    /// Initialize application state with the HTTP Mastodon client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let client = mastodon::HttpMastodonClient::new(&config.upstream)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Initialize application state around an arbitrary Mastodon client
    pub fn with_client(config: config::AppConfig, client: Arc<dyn MastodonClient>) -> Self {
        let authorization = service::AuthorizationGate::new(
            config.authorization.allowed_root_accounts.clone(),
            config.authorization.cache_capacity,
            client.clone(),
        );
        let interactions = service::InteractionService::new(client, config.upstream.max_pages);

        tracing::info!(
            allowed_root_accounts = authorization.allowed_root_account_count(),
            cache_capacity = config.authorization.cache_capacity,
            max_pages = config.upstream.max_pages,
            "Application state initialized"
        );

        Self {
            config: Arc::new(config),
            authorization: Arc::new(authorization),
            interactions: Arc::new(interactions),
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower::ServiceBuilder;
    use tower_http::trace::TraceLayer;

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::statuses_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method};
    use tower_http::cors::{AllowOrigin, CorsLayer};

    if server.allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(
                    %error,
                    %origin,
                    "Ignoring unparseable CORS origin"
                );
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_credentials(true)
}

async fn health_check() -> &'static str {
    "OK"
}
