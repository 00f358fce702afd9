mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod handlers;
mod middleware;
mod models;
mod openapi;
mod startup;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use auth::{HttpKeySource, IdentityReconciler, JwksCache, TokenVerifier};
pub use config::AppConfig;
pub use db::{PgUserStore, UserStore};
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub verifier: Arc<TokenVerifier>,
    pub reconciler: IdentityReconciler,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,volunteer_match_auth=debug,tower_http=debug".into());

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    // Create database pool and apply migrations
    let db = db::create_pool(&config.database_url).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;

    tracing::info!("Database pool created successfully");

    // Initialize metrics recorder
    let metrics_state = Arc::new(handlers::setup_metrics_recorder()?);
    tracing::info!("Metrics recorder initialized");

    // Identity gate: provider key set -> token verifier -> reconciler
    let key_source = Arc::new(HttpKeySource::new(
        &config.auth.jwks_url,
        config.auth.jwks_fetch_timeout,
    )?);
    let jwks_cache = Arc::new(JwksCache::new(
        key_source,
        config.auth.jwks_ttl,
        config.auth.jwks_refresh_cooldown,
    ));

    // Warm the key set; a failure here is retried on first use.
    if let Err(e) = jwks_cache.get_jwks().await {
        tracing::warn!(error = %e, url = %config.auth.jwks_url, "Initial JWKS fetch failed");
    }

    let verifier = Arc::new(TokenVerifier::new(jwks_cache, config.auth.policy()));
    tracing::info!(issuer = %config.auth.issuer, algorithm = ?config.auth.algorithm, "Token verifier ready");

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db, config.store_timeout));
    let reconciler = IdentityReconciler::new(users.clone());

    let bind_addr = config.bind_addr.clone();

    // Create application state
    let state = Arc::new(AppState {
        users,
        verifier,
        reconciler,
        config,
        metrics: metrics_state,
    });

    // Build router
    let app = startup::build_router(state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
