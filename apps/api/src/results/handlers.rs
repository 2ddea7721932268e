use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::food::{CreateDietResult, DietResultRow};
use crate::models::profile::required_text;
use crate::state::AppState;

/// POST /api/v1/results
pub async fn handle_create_result(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateDietResult>,
) -> Result<(StatusCode, Json<DietResultRow>), AppError> {
    let recommendation = required_text("diet_recommendation", &req.diet_recommendation, 50)?;
    req.nutrients.validate()?;
    if state.users.find_by_id(auth.user_id).await?.is_none() {
        return Err(AppError::Unauthorized);
    }

    let row = sqlx::query_as::<_, DietResultRow>(
        r#"
        INSERT INTO diet_results
            (id, user_id, diet_recommendation, calories, protein, carbs, fats)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.user_id)
    .bind(&recommendation)
    .bind(req.nutrients.calories)
    .bind(req.nutrients.protein)
    .bind(req.nutrients.carbs)
    .bind(req.nutrients.fats)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/results
pub async fn handle_list_results(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DietResultRow>>, AppError> {
    let rows: Vec<DietResultRow> = sqlx::query_as(
        "SELECT * FROM diet_results WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    if rows.is_empty() {
        return Err(AppError::NotFound(
            "No diet records found for this user".to_string(),
        ));
    }
    Ok(Json(rows))
}
