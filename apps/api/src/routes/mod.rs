pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::diet::handlers as diet;
use crate::foods::handlers as foods;
use crate::profiles::handlers as profiles;
use crate::results::handlers as results;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/refresh", post(auth::handle_refresh))
        // Profiles
        .route(
            "/api/v1/profiles",
            post(profiles::handle_submit_profile).get(profiles::handle_list_profiles),
        )
        // Diet model
        .route("/api/v1/diet/train", post(diet::handle_train))
        .route("/api/v1/diet/predict", post(diet::handle_predict))
        .route(
            "/api/v1/diet/predict/input",
            post(diet::handle_predict_input),
        )
        .route("/api/v1/diet/model", get(diet::handle_model_status))
        // Foods and recorded results
        .route("/api/v1/foods", post(foods::handle_create_food))
        .route("/api/v1/foods/:id", get(foods::handle_get_food))
        .route(
            "/api/v1/results",
            post(results::handle_create_result).get(results::handle_list_results),
        )
        .with_state(state)
}
