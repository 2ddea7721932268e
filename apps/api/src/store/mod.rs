//! Persistence seams for accounts and profiles. Handlers hold these as
//! `Arc<dyn _>`; Postgres backs them in production.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::profile::{ProfileAttributes, ProfileRow};
use crate::models::user::User;

pub use postgres::{PgProfileStore, PgUserStore};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CreateUser {
    Created(User),
    UsernameTaken,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<CreateUser>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Append-only profile history.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, attributes: &ProfileAttributes) -> Result<ProfileRow>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfileRow>>;
    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ProfileRow>>;
    /// Every stored profile, oldest first.
    async fn list_all(&self) -> Result<Vec<ProfileRow>>;
}
