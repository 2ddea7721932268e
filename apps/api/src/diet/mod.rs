//! Diet recommendation: feature encoding, forest training, artifact storage
//! and prediction for stored or ad-hoc profiles.

pub mod artifacts;
pub mod encoder;
pub mod forest;
pub mod handlers;
pub mod predictor;
pub mod trainer;

use thiserror::Error;
use uuid::Uuid;

use crate::diet::artifacts::ArtifactError;
use crate::models::profile::FieldError;

#[derive(Debug, Error)]
pub enum DietError {
    #[error("No training data available")]
    NoTrainingData,

    #[error("Model not trained yet")]
    ModelNotTrained,

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("No saved diet data found for user {0}")]
    NoProfileData(Uuid),

    #[error("Invalid profile: {0}")]
    InvalidProfile(FieldError),

    #[error("Model fit failed: {0}")]
    Fit(String),

    #[error("Artifact store error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Store error: {0}")]
    Store(anyhow::Error),
}
