use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::FieldError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodRow {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DietResultRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub diet_recommendation: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Nutrients {
    pub fn validate(&self) -> Result<(), FieldError> {
        for (field, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError {
                    field,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFood {
    pub name: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDietResult {
    pub diet_recommendation: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrients_must_be_non_negative() {
        let ok = Nutrients {
            calories: 250.0,
            protein: 0.0,
            carbs: 30.5,
            fats: 8.0,
        };
        assert!(ok.validate().is_ok());

        let bad = Nutrients { fats: -1.0, ..ok.clone() };
        assert_eq!(bad.validate().unwrap_err().field, "fats");

        let inf = Nutrients {
            calories: f64::INFINITY,
            ..ok
        };
        assert_eq!(inf.validate().unwrap_err().field, "calories");
    }

    #[test]
    fn test_flattened_request_body() {
        let food: CreateFood = serde_json::from_str(
            r#"{"name":"Oats","calories":389,"protein":16.9,"carbs":66.3,"fats":6.9}"#,
        )
        .unwrap();
        assert_eq!(food.name, "Oats");
        assert_eq!(food.nutrients.calories, 389.0);
    }
}
