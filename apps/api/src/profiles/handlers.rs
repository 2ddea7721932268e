use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::{ProfileAttributes, ProfileRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitProfileResponse {
    pub profile_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<ProfileRow>,
}

/// POST /api/v1/profiles
pub async fn handle_submit_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ProfileAttributes>,
) -> Result<(StatusCode, Json<SubmitProfileResponse>), AppError> {
    let attributes = req.normalized()?;
    if state.users.find_by_id(auth.user_id).await?.is_none() {
        warn!("Profile submitted for deleted user {}", auth.user_id);
        return Err(AppError::Unauthorized);
    }
    let row = state.profiles.insert(auth.user_id, &attributes).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitProfileResponse {
            profile_id: row.id,
            message: "Diet data saved successfully".to_string(),
        }),
    ))
}

/// GET /api/v1/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileListResponse>, AppError> {
    let profiles = state.profiles.list_for_user(auth.user_id).await?;
    if profiles.is_empty() {
        return Err(AppError::NotFound(
            "No diet records found for this user".to_string(),
        ));
    }
    Ok(Json(ProfileListResponse { profiles }))
}
