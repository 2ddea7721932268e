use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::diet::predictor::{predict_for_input, predict_for_user, Prediction};
use crate::diet::trainer::{retrain, RefitPolicy};
use crate::errors::AppError;
use crate::models::profile::ProfileAttributes;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub message: String,
    pub accuracy: f64,
    pub version: u64,
    pub samples: usize,
    pub evaluated_on_training_set: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_diet: String,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        PredictResponse {
            predicted_diet: p.predicted_diet,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub trained: bool,
    pub version: Option<u64>,
    pub trained_at: Option<DateTime<Utc>>,
    pub accuracy: Option<f64>,
    pub samples: Option<usize>,
    pub refit: Option<RefitPolicy>,
    pub feature_columns: Vec<String>,
    pub labels: Vec<String>,
}

/// POST /api/v1/diet/train
pub async fn handle_train(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TrainResponse>, AppError> {
    tracing::info!("Retrain requested by {}", auth.username);
    let artifact = retrain(
        state.profiles.as_ref(),
        &state.artifacts,
        state.config.training,
    )
    .await?;

    Ok(Json(TrainResponse {
        message: "Model trained successfully".to_string(),
        accuracy: artifact.metrics.accuracy,
        version: artifact.version,
        samples: artifact.metrics.samples,
        evaluated_on_training_set: artifact.metrics.evaluated_on_training_set,
    }))
}

/// POST /api/v1/diet/predict
pub async fn handle_predict(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PredictResponse>, AppError> {
    let prediction = predict_for_user(
        &state.artifacts,
        state.users.as_ref(),
        state.profiles.as_ref(),
        auth.user_id,
    )
    .await?;
    tracing::debug!(
        "Predicted {} for {} with model v{}",
        prediction.predicted_diet,
        auth.username,
        prediction.model_version
    );
    Ok(Json(prediction.into()))
}

/// POST /api/v1/diet/predict/input
pub async fn handle_predict_input(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<ProfileAttributes>,
) -> Result<Json<PredictResponse>, AppError> {
    let prediction = predict_for_input(&state.artifacts, &req).await?;
    Ok(Json(prediction.into()))
}

/// GET /api/v1/diet/model
pub async fn handle_model_status(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<ModelStatus> {
    let status = match state.artifacts.current().await {
        Some(a) => ModelStatus {
            trained: true,
            version: Some(a.version),
            trained_at: Some(a.trained_at),
            accuracy: Some(a.metrics.accuracy),
            samples: Some(a.metrics.samples),
            refit: Some(a.metrics.refit),
            feature_columns: a.schema.columns(),
            labels: a.classifier.labels().to_vec(),
        },
        None => ModelStatus {
            trained: false,
            version: None,
            trained_at: None,
            accuracy: None,
            samples: None,
            refit: None,
            feature_columns: vec![],
            labels: vec![],
        },
    };
    Json(status)
}
