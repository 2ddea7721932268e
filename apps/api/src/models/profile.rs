use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const MAX_CATEGORY_LEN: usize = 50;

/// The seven attributes a user submits for a diet recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub age: i32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub activity_level: String,
    pub goal: String,
    pub dietary_preference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl ProfileAttributes {
    /// Checks every field and returns a copy with categorical values trimmed.
    pub fn normalized(&self) -> Result<Self, FieldError> {
        if !(1..=120).contains(&self.age) {
            return Err(FieldError {
                field: "age",
                reason: format!("must be between 1 and 120, got {}", self.age),
            });
        }
        check_positive("height", self.height)?;
        check_positive("weight", self.weight)?;

        Ok(ProfileAttributes {
            age: self.age,
            gender: check_category("gender", &self.gender)?,
            height: self.height,
            weight: self.weight,
            activity_level: check_category("activity_level", &self.activity_level)?,
            goal: check_category("goal", &self.goal)?,
            dietary_preference: check_category("dietary_preference", &self.dietary_preference)?,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), FieldError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FieldError {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

fn check_category(field: &'static str, value: &str) -> Result<String, FieldError> {
    required_text(field, value, MAX_CATEGORY_LEN)
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if trimmed.chars().count() > max {
        return Err(FieldError {
            field,
            reason: format!("must be at most {max} characters"),
        });
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip)]
    pub seq: i64,
    pub age: i32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub activity_level: String,
    pub goal: String,
    pub dietary_preference: String,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn attributes(&self) -> ProfileAttributes {
        ProfileAttributes {
            age: self.age,
            gender: self.gender.clone(),
            height: self.height,
            weight: self.weight,
            activity_level: self.activity_level.clone(),
            goal: self.goal.clone(),
            dietary_preference: self.dietary_preference.clone(),
        }
    }
}
