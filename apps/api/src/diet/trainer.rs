use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::diet::artifacts::{ArtifactStore, TrainedArtifact};
use crate::diet::encoder::{encode_training_batch, FeatureSchema};
use crate::diet::forest::{DietClassifier, ForestParams};
use crate::diet::DietError;
use crate::models::profile::ProfileAttributes;
use crate::store::ProfileStore;

/// Below this many records the model is scored on its own training data.
pub const MIN_SPLIT_SAMPLES: usize = 5;
pub const TEST_FRACTION: f64 = 0.2;

/// Which model gets deployed after a held-out evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefitPolicy {
    /// Deploy the model fit on the training split.
    SplitOnly,
    /// Evaluate on the split, then refit on every record and deploy that.
    FullData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingConfig {
    pub forest: ForestParams,
    pub refit: RefitPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            forest: ForestParams::default(),
            refit: RefitPolicy::SplitOnly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Fraction correct on the evaluation rows, rounded to 4 decimals.
    pub accuracy: f64,
    pub samples: usize,
    pub evaluated_samples: usize,
    pub evaluated_on_training_set: bool,
    pub refit: RefitPolicy,
}

pub struct TrainingOutcome {
    pub schema: FeatureSchema,
    pub classifier: DietClassifier,
    pub metrics: TrainingMetrics,
}

/// Fits a classifier predicting `dietary_preference` from the other six fields.
pub fn train(records: &[ProfileAttributes], config: &TrainingConfig) -> Result<TrainingOutcome, DietError> {
    if records.is_empty() {
        return Err(DietError::NoTrainingData);
    }

    let batch = encode_training_batch(records);
    let labels: Vec<String> = records.iter().map(|r| r.dietary_preference.clone()).collect();
    let n = records.len();

    if n < MIN_SPLIT_SAMPLES {
        let classifier = DietClassifier::fit(batch.features.view(), &labels, &config.forest)?;
        let predicted = classifier.predict(&batch.features)?;
        return Ok(TrainingOutcome {
            schema: batch.schema,
            classifier,
            metrics: TrainingMetrics {
                accuracy: accuracy(&predicted, &labels),
                samples: n,
                evaluated_samples: n,
                evaluated_on_training_set: true,
                refit: config.refit,
            },
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(config.forest.seed));
    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    let (test_idx, train_idx) = order.split_at(n_test);

    let train_x = batch.features.select(ndarray::Axis(0), train_idx);
    let train_y: Vec<String> = train_idx.iter().map(|&i| labels[i].clone()).collect();
    let test_x = batch.features.select(ndarray::Axis(0), test_idx);
    let test_y: Vec<String> = test_idx.iter().map(|&i| labels[i].clone()).collect();

    let split_model = DietClassifier::fit(train_x.view(), &train_y, &config.forest)?;
    let accuracy = accuracy(&split_model.predict(&test_x)?, &test_y);

    let classifier = match config.refit {
        RefitPolicy::SplitOnly => split_model,
        RefitPolicy::FullData => DietClassifier::fit(batch.features.view(), &labels, &config.forest)?,
    };

    Ok(TrainingOutcome {
        schema: batch.schema,
        classifier,
        metrics: TrainingMetrics {
            accuracy,
            samples: n,
            evaluated_samples: test_idx.len(),
            evaluated_on_training_set: false,
            refit: config.refit,
        },
    })
}

fn accuracy(predicted: &[String], truth: &[String]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    let fraction = correct as f64 / truth.len() as f64;
    (fraction * 10_000.0).round() / 10_000.0
}

/// Trains on every stored profile and publishes the result as the current model.
pub async fn retrain(
    profiles: &dyn ProfileStore,
    artifacts: &ArtifactStore,
    config: TrainingConfig,
) -> Result<Arc<TrainedArtifact>, DietError> {
    let records: Vec<ProfileAttributes> = profiles
        .list_all()
        .await
        .map_err(DietError::Store)?
        .iter()
        .map(|row| row.attributes())
        .collect();

    if records.is_empty() {
        return Err(DietError::NoTrainingData);
    }
    info!("Training diet model on {} profiles", records.len());

    let outcome = tokio::task::spawn_blocking(move || train(&records, &config))
        .await
        .map_err(|e| DietError::Fit(format!("training task failed: {e}")))??;

    Ok(artifacts.publish(outcome).await?)
}
