use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::food::{CreateFood, FoodRow};
use crate::models::profile::required_text;
use crate::state::AppState;

/// POST /api/v1/foods
pub async fn handle_create_food(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<CreateFood>,
) -> Result<(StatusCode, Json<FoodRow>), AppError> {
    let name = required_text("name", &req.name, 150)?;
    req.nutrients.validate()?;

    let food = sqlx::query_as::<_, FoodRow>(
        r#"
        INSERT INTO foods (id, name, calories, protein, carbs, fats)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(req.nutrients.calories)
    .bind(req.nutrients.protein)
    .bind(req.nutrients.carbs)
    .bind(req.nutrients.fats)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(food)))
}

/// GET /api/v1/foods/:id
pub async fn handle_get_food(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodRow>, AppError> {
    let food: Option<FoodRow> = sqlx::query_as("SELECT * FROM foods WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    food.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Food {id} not found")))
}
