use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{ConfirmationGateway, ConfirmationStore, InMemoryConfirmationStore};
use persistence::repositories::PgConfirmationStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{Config, StoreBackend, StoreConfig};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{confirmations, dashboard, health, redirect_to_form, registration};

#[derive(Clone)]
pub struct AppState {
    pub gateway: ConfirmationGateway,
    pub config: Arc<Config>,
}

/// Opens the configured confirmation store. For postgres this connects,
/// migrates and starts the change listener.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn ConfirmationStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory confirmation store");
            Ok(Arc::new(InMemoryConfirmationStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = persistence::db::create_pool(&config.database_config()).await?;
            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");
            Ok(Arc::new(PgConfirmationStore::connect(pool).await?))
        }
    }
}

pub fn create_app(config: Config, store: Arc<dyn ConfirmationStore>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        gateway: ConfirmationGateway::new(store),
        config: config.clone(),
    };

    // Empty origin list allows any origin (development)
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let guest_routes = Router::new()
        .route(
            "/",
            get(registration::get_form).post(registration::submit_registration),
        )
        .route("/api/v1/confirmations", post(confirmations::create_confirmation));

    let dashboard_routes = Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/stream", get(dashboard::stream_dashboard));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(guest_routes)
        .merge(dashboard_routes)
        .merge(public_routes)
        .fallback(redirect_to_form)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
