use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::profile::{ProfileAttributes, ProfileRow};
use crate::models::user::User;
use crate::store::{CreateUser, NewUser, ProfileStore, UserStore};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        PgUserStore { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<CreateUser> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                info!("Created user {} ({})", row.username, row.id);
                Ok(CreateUser::Created(row))
            }
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Ok(CreateUser::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        PgProfileStore { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn insert(&self, user_id: Uuid, attributes: &ProfileAttributes) -> Result<ProfileRow> {
        // Append-only: every submission is a new row, never UPDATE.
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO diet_profiles
                (id, user_id, age, gender, height, weight,
                 activity_level, goal, dietary_preference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(attributes.age)
        .bind(&attributes.gender)
        .bind(attributes.height)
        .bind(attributes.weight)
        .bind(&attributes.activity_level)
        .bind(&attributes.goal)
        .bind(&attributes.dietary_preference)
        .fetch_one(&self.pool)
        .await?;

        info!("Stored profile {} for user {user_id}", row.id);
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfileRow>> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM diet_profiles WHERE user_id = $1 ORDER BY created_at DESC, seq DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT * FROM diet_profiles
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_all(&self) -> Result<Vec<ProfileRow>> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM diet_profiles ORDER BY created_at ASC, seq ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
