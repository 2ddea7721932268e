use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenKind};
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{CreateUser, NewUser};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 150;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Err(AppError::Validation(
            "username: must be between 3 and 30 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AppError::Validation(
            "username: may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(())
}

fn clean_name(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    if value.as_ref().is_some_and(|v| v.chars().count() > MAX_NAME_LEN) {
        return Err(AppError::Validation(format!(
            "{field}: must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value)
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let username = req.username.trim().to_string();
    validate_username(&username)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password: must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let first_name = clean_name("first_name", req.first_name)?;
    let last_name = clean_name("last_name", req.last_name)?;

    let password_hash = hash_password(req.password, state.config.bcrypt_cost).await?;
    let created = state
        .users
        .create(NewUser {
            username: username.clone(),
            password_hash,
            first_name,
            last_name,
        })
        .await?;

    match created {
        CreateUser::Created(user) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                user_id: user.id,
                message: "User created successfully".to_string(),
            }),
        )),
        CreateUser::UsernameTaken => Err(AppError::Conflict(format!(
            "A user with username '{username}' already exists"
        ))),
    }
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        warn!("Invalid password for user {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    let issued = state.tokens.issue(user.id, &user.username, TokenKind::Access)?;
    let refresh = state.tokens.issue(user.id, &user.username, TokenKind::Refresh)?;
    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        access_token: issued.token,
        refresh_token: refresh.token,
        token_type: "Bearer",
        user_id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        expires_at: issued.expires_at,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new access token. The refresh token itself
/// is not rotated.
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let claims = state
        .tokens
        .verify(req.refresh_token.trim(), TokenKind::Refresh)?;

    let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        warn!("Refresh token for unknown user {}", claims.sub);
        AppError::Unauthorized
    })?;

    let issued = state.tokens.issue(user.id, &user.username, TokenKind::Access)?;
    Ok(Json(RefreshResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_at: issued.expires_at,
    }))
}
