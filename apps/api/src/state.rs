use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::diet::artifacts::ArtifactStore;
use crate::store::{ProfileStore, UserStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the food and result handlers.
    pub db: PgPool,
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    /// Current trained model. Swapped atomically on every retrain.
    pub artifacts: Arc<ArtifactStore>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Config,
}
