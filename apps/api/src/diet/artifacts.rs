//! Versioned storage for trained models.
//!
//! Schema, classifier and metrics travel as one artifact, so a model can never
//! be read back with someone else's columns. Publishing writes a new
//! `model-v{N}.json`, then atomically repoints `CURRENT` at it, then swaps the
//! in-memory handle. Readers hold an `Arc` to whatever was current when they
//! asked.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::diet::encoder::FeatureSchema;
use crate::diet::forest::DietClassifier;
use crate::diet::trainer::{TrainingMetrics, TrainingOutcome};

pub const POINTER_FILE: &str = "CURRENT";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Atomic replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid artifact pointer: {0:?}")]
    Pointer(String),

    #[error("Artifact schema has {schema} columns but its model expects {model}")]
    Mismatch { schema: usize, model: usize },

    #[error("Artifact task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub version: u64,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub classifier: DietClassifier,
    pub metrics: TrainingMetrics,
}

pub struct ArtifactStore {
    dir: PathBuf,
    current: RwLock<Option<Arc<TrainedArtifact>>>,
    publish_lock: Mutex<()>,
}

impl ArtifactStore {
    /// Opens `dir`, creating it if needed, and loads whatever `CURRENT` names.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let current = match tokio::fs::read_to_string(dir.join(POINTER_FILE)).await {
            Ok(name) => {
                let artifact = read_artifact(&dir, name.trim()).await?;
                info!(
                    "Loaded diet model v{} ({} columns) from {}",
                    artifact.version,
                    artifact.schema.width(),
                    dir.display()
                );
                Some(Arc::new(artifact))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No trained diet model in {}", dir.display());
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ArtifactStore {
            dir,
            current: RwLock::new(current),
            publish_lock: Mutex::new(()),
        })
    }

    pub async fn current(&self) -> Option<Arc<TrainedArtifact>> {
        self.current.read().await.clone()
    }

    /// Persists `outcome` as the next version and makes it current.
    /// On error the previous artifact stays current.
    pub async fn publish(&self, outcome: TrainingOutcome) -> Result<Arc<TrainedArtifact>, ArtifactError> {
        let _guard = self.publish_lock.lock().await;

        let version = self.current().await.map_or(1, |a| a.version + 1);
        let artifact = TrainedArtifact {
            version,
            trained_at: Utc::now(),
            schema: outcome.schema,
            classifier: outcome.classifier,
            metrics: outcome.metrics,
        };

        let bytes = serde_json::to_vec(&artifact)?;
        let dir = self.dir.clone();
        let file_name = artifact_file_name(version);
        tokio::task::spawn_blocking(move || write_and_repoint(&dir, &file_name, &bytes))
            .await
            .map_err(|e| ArtifactError::Task(e.to_string()))??;

        let artifact = Arc::new(artifact);
        *self.current.write().await = Some(Arc::clone(&artifact));
        info!(
            "Published diet model v{} (accuracy {:.4}, {} samples)",
            artifact.version, artifact.metrics.accuracy, artifact.metrics.samples
        );
        Ok(artifact)
    }
}

fn artifact_file_name(version: u64) -> String {
    format!("model-v{version}.json")
}

async fn read_artifact(dir: &Path, name: &str) -> Result<TrainedArtifact, ArtifactError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ArtifactError::Pointer(name.to_string()));
    }
    let bytes = tokio::fs::read(dir.join(name)).await?;
    let artifact: TrainedArtifact = serde_json::from_slice(&bytes)?;
    if artifact.schema.width() != artifact.classifier.n_features() {
        return Err(ArtifactError::Mismatch {
            schema: artifact.schema.width(),
            model: artifact.classifier.n_features(),
        });
    }
    if artifact_file_name(artifact.version) != name {
        warn!("Artifact {name} carries version {}", artifact.version);
    }
    Ok(artifact)
}

fn write_and_repoint(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
    write_atomic(dir, file_name, bytes)?;
    write_atomic(dir, POINTER_FILE, file_name.as_bytes())
}

/// Temp file in the target directory, fsync, then rename over `name`.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name))?;
    Ok(())
}
