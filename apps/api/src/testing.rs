//! In-memory stores and fixtures shared by unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::diet::artifacts::ArtifactStore;
use crate::diet::forest::ForestParams;
use crate::diet::trainer::TrainingConfig;
use crate::models::profile::{ProfileAttributes, ProfileRow};
use crate::models::user::User;
use crate::state::AppState;
use crate::store::{CreateUser, NewUser, ProfileStore, UserStore};

pub fn profile(age: i32, gender: &str, activity: &str, goal: &str, pref: &str) -> ProfileAttributes {
    ProfileAttributes {
        age,
        gender: gender.to_string(),
        height: 150.0 + f64::from(age % 40),
        weight: 50.0 + f64::from(age % 35),
        activity_level: activity.to_string(),
        goal: goal.to_string(),
        dietary_preference: pref.to_string(),
    }
}

/// Twelve varied, labelled profiles.
pub fn sample_profiles() -> Vec<ProfileAttributes> {
    vec![
        profile(30, "Male", "Moderate", "Muscle Gain", "Balanced"),
        profile(24, "Male", "High", "Muscle Gain", "High Protein"),
        profile(27, "Male", "High", "Muscle Gain", "High Protein"),
        profile(45, "Female", "Low", "Weight Loss", "Low Carb"),
        profile(52, "Female", "Low", "Weight Loss", "Low Carb"),
        profile(35, "Female", "Moderate", "Maintenance", "Balanced"),
        profile(29, "Female", "High", "Weight Loss", "Vegan"),
        profile(33, "Male", "Low", "Weight Loss", "Low Carb"),
        profile(41, "Male", "Moderate", "Maintenance", "Balanced"),
        profile(22, "Female", "High", "Muscle Gain", "High Protein"),
        profile(38, "Female", "Moderate", "Weight Loss", "Vegan"),
        profile(60, "Male", "Low", "Maintenance", "Balanced"),
    ]
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<CreateUser> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Ok(CreateUser::UsernameTaken);
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: now,
            updated_at: now,
        };
        users.push(row.clone());
        Ok(CreateUser::Created(row))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<Vec<ProfileRow>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert(&self, user_id: Uuid, a: &ProfileAttributes) -> Result<ProfileRow> {
        let mut rows = self.rows.lock().unwrap();
        let row = ProfileRow {
            id: Uuid::new_v4(),
            user_id,
            seq: rows.len() as i64 + 1,
            age: a.age,
            gender: a.gender.clone(),
            height: a.height,
            weight: a.weight,
            activity_level: a.activity_level.clone(),
            goal: a.goal.clone(),
            dietary_preference: a.dietary_preference.clone(),
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfileRow>> {
        let rows = self.rows.lock().unwrap();
        let mut mine: Vec<ProfileRow> = rows.iter().filter(|r| r.user_id == user_id).cloned().collect();
        mine.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
        Ok(mine)
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        Ok(self.list_for_user(user_id).await?.into_iter().next())
    }

    async fn list_all(&self) -> Result<Vec<ProfileRow>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

pub fn test_config(artifact_dir: &Path) -> Config {
    Config {
        database_url: "postgres://localhost/diet_api_test".to_string(),
        jwt_secret: "test-secret".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        access_token_ttl_minutes: 30,
        refresh_token_ttl_days: 30,
        bcrypt_cost: 4,
        artifact_dir: artifact_dir.to_path_buf(),
        training: TrainingConfig {
            forest: ForestParams {
                n_estimators: 20,
                ..ForestParams::default()
            },
            ..TrainingConfig::default()
        },
    }
}

/// Full application state over in-memory stores. The pool never connects,
/// so only routes backed by the stores can be exercised.
pub async fn test_state(artifact_dir: &Path) -> AppState {
    let config = test_config(artifact_dir);
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    AppState {
        db,
        users: Arc::new(MemoryUserStore::default()),
        profiles: Arc::new(MemoryProfileStore::default()),
        artifacts: Arc::new(ArtifactStore::open(artifact_dir).await.unwrap()),
        tokens: Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        )),
        config,
    }
}
