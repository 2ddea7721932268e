//! One-hot feature encoding for profiles.
//!
//! Training builds a [`FeatureSchema`] from the batch: numeric fields pass
//! through, every categorical field expands into one indicator column per
//! value seen. Prediction encodes against that same schema, so the output
//! width and column order never depend on the single record being encoded.

use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::models::profile::ProfileAttributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Age,
    Height,
    Weight,
}

impl NumericField {
    pub const ALL: [NumericField; 3] = [NumericField::Age, NumericField::Height, NumericField::Weight];

    pub fn name(self) -> &'static str {
        match self {
            NumericField::Age => "age",
            NumericField::Height => "height",
            NumericField::Weight => "weight",
        }
    }

    fn value(self, record: &ProfileAttributes) -> f64 {
        match self {
            NumericField::Age => f64::from(record.age),
            NumericField::Height => record.height,
            NumericField::Weight => record.weight,
        }
    }
}

/// Categorical predictors. `dietary_preference` is the label, not a
/// predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Gender,
    ActivityLevel,
    Goal,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Gender,
        CategoricalField::ActivityLevel,
        CategoricalField::Goal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::Gender => "gender",
            CategoricalField::ActivityLevel => "activity_level",
            CategoricalField::Goal => "goal",
        }
    }

    fn value(self, record: &ProfileAttributes) -> &str {
        match self {
            CategoricalField::Gender => &record.gender,
            CategoricalField::ActivityLevel => &record.activity_level,
            CategoricalField::Goal => &record.goal,
        }
    }

    fn column(self, value: &str) -> String {
        format!("{}_{}", self.name(), value)
    }
}

/// Indicator encoding rule for one categorical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub field: CategoricalField,
    /// Sorted, deduplicated values observed at training time.
    pub values: Vec<String>,
}

/// Ordered field list plus per-field encoding rule, fixed by a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<NumericField>,
    pub categorical: Vec<CategoricalEncoding>,
}

impl FeatureSchema {
    /// The FeatureColumnSet: numeric columns first, then `<field>_<value>`
    /// indicators per categorical field.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.numeric.iter().map(|f| f.name().to_string()).collect();
        for encoding in &self.categorical {
            columns.extend(encoding.values.iter().map(|v| encoding.field.column(v)));
        }
        columns
    }

    pub fn width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.values.len()).sum::<usize>()
    }
}

pub struct EncodedBatch {
    pub features: Array2<f64>,
    pub schema: FeatureSchema,
}

/// Builds the schema from every distinct categorical value in `records` and
/// encodes the batch against it.
pub fn encode_training_batch(records: &[ProfileAttributes]) -> EncodedBatch {
    let categorical = CategoricalField::ALL
        .iter()
        .map(|&field| {
            let values: BTreeSet<&str> = records.iter().map(|r| field.value(r)).collect();
            CategoricalEncoding {
                field,
                values: values.into_iter().map(str::to_string).collect(),
            }
        })
        .collect();

    let schema = FeatureSchema {
        numeric: NumericField::ALL.to_vec(),
        categorical,
    };

    let rows: Vec<Vec<f64>> = records
        .iter()
        .map(|r| encode_for_prediction(r, &schema))
        .collect();
    let features = Array2::from_shape_fn((rows.len(), schema.width()), |(i, j)| rows[i][j]);

    EncodedBatch { features, schema }
}

/// Expands one record into its own named columns, as if it were a batch of one.
fn expand(record: &ProfileAttributes) -> HashMap<String, f64> {
    let mut expanded: HashMap<String, f64> = NumericField::ALL
        .iter()
        .map(|f| (f.name().to_string(), f.value(record)))
        .collect();
    for field in CategoricalField::ALL {
        expanded.insert(field.column(field.value(record)), 1.0);
    }
    expanded
}

/// Encodes a single record onto `schema`'s columns. Columns the record does
/// not produce are 0; columns the schema does not know are dropped.
pub fn encode_for_prediction(record: &ProfileAttributes, schema: &FeatureSchema) -> Vec<f64> {
    let expanded = expand(record);
    schema
        .columns()
        .iter()
        .map(|column| expanded.get(column).copied().unwrap_or(0.0))
        .collect()
}
