//! Bagged ensemble of CART trees with majority voting.

use std::collections::BTreeSet;

use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::diet::DietError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietClassifier {
    /// Sorted label vocabulary; tree outputs index into it.
    labels: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree<f64, usize>>,
}

impl DietClassifier {
    /// Fits `params.n_estimators` trees, each on a bootstrap sample of the rows.
    pub fn fit(
        features: ArrayView2<'_, f64>,
        labels: &[String],
        params: &ForestParams,
    ) -> Result<Self, DietError> {
        let n_rows = features.nrows();
        if n_rows == 0 {
            return Err(DietError::NoTrainingData);
        }
        if labels.len() != n_rows {
            return Err(DietError::Fit(format!(
                "{} feature rows but {} labels",
                n_rows,
                labels.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(DietError::Fit("n_estimators must be at least 1".to_string()));
        }

        let vocabulary: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let targets: Array1<usize> = labels
            .iter()
            .map(|l| vocabulary.binary_search(l).unwrap_or_default())
            .collect();

        let tree_params = DecisionTree::<f64, usize>::params().max_depth(params.max_depth);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let dataset = Dataset::new(
                features.select(Axis(0), &sample),
                targets.select(Axis(0), &sample),
            );
            let tree: DecisionTree<f64, usize> = tree_params
                .fit(&dataset)
                .map_err(|e: linfa::Error| DietError::Fit(e.to_string()))?;
            trees.push(tree);
        }

        Ok(DietClassifier {
            labels: vocabulary,
            n_features: features.ncols(),
            trees,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Majority vote per row. Ties go to the smaller label.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Vec<String>, DietError> {
        if features.ncols() != self.n_features {
            return Err(DietError::Fit(format!(
                "model expects {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let mut votes = vec![vec![0usize; self.labels.len()]; features.nrows()];
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(features);
            for (row, class) in predicted.iter().enumerate() {
                if let Some(count) = votes[row].get_mut(*class) {
                    *count += 1;
                }
            }
        }

        Ok(votes
            .iter()
            .map(|counts| {
                let mut best = 0;
                for (class, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = class;
                    }
                }
                self.labels[best].clone()
            })
            .collect())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<String, DietError> {
        let features = Array1::from(row.to_vec()).insert_axis(Axis(0));
        self.predict(&features)?
            .pop()
            .ok_or_else(|| DietError::Fit("empty prediction".to_string()))
    }
}
