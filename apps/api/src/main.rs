mod auth;
mod config;
mod db;
mod diet;
mod errors;
mod foods;
mod models;
mod profiles;
mod results;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::diet::artifacts::ArtifactStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{PgProfileStore, PgUserStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Diet API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Load the current model, if any
    let artifacts = ArtifactStore::open(&config.artifact_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to open model artifacts in {}",
                config.artifact_dir.display()
            )
        })?;
    info!(
        "Training: {} trees, refit policy {:?}",
        config.training.forest.n_estimators, config.training.refit
    );

    let state = AppState {
        users: Arc::new(PgUserStore::new(db.clone())),
        profiles: Arc::new(PgProfileStore::new(db.clone())),
        db,
        artifacts: Arc::new(artifacts),
        tokens: Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        )),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
