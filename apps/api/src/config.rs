use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::diet::forest::ForestParams;
use crate::diet::trainer::{RefitPolicy, TrainingConfig};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub artifact_dir: PathBuf,
    pub training: TrainingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let refit = if parse_env("TRAIN_REFIT_ON_FULL_DATA", false)? {
            RefitPolicy::FullData
        } else {
            RefitPolicy::SplitOnly
        };

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            access_token_ttl_minutes: parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_ttl_days: parse_env("REFRESH_TOKEN_EXPIRE_DAYS", 30)?,
            bcrypt_cost: parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            artifact_dir: std::env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./artifacts")),
            training: TrainingConfig {
                forest: ForestParams {
                    n_estimators: parse_env("TRAIN_N_ESTIMATORS", 100)?,
                    max_depth: parse_optional_env("TRAIN_MAX_DEPTH")?,
                    seed: parse_env("TRAIN_SEED", 42)?,
                },
                refit,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but would fail later at request time.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            self.access_token_ttl_minutes,
            1,
            MAX_ACCESS_TOKEN_MINUTES,
        )?;
        check_range(
            "REFRESH_TOKEN_EXPIRE_DAYS",
            self.refresh_token_ttl_days,
            1,
            MAX_REFRESH_TOKEN_DAYS,
        )?;
        check_range("BCRYPT_COST", self.bcrypt_cost, 4, 31)?;
        check_range(
            "TRAIN_N_ESTIMATORS",
            self.training.forest.n_estimators,
            1,
            MAX_ESTIMATORS,
        )?;
        if let Some(depth) = self.training.forest.max_depth {
            check_range("TRAIN_MAX_DEPTH", depth, 1, usize::MAX)?;
        }
        if self.jwt_secret.trim().is_empty() {
            bail!("Environment variable 'JWT_SECRET' must not be empty");
        }
        Ok(())
    }
}

/// One year.
const MAX_ACCESS_TOKEN_MINUTES: i64 = 525_600;
const MAX_REFRESH_TOKEN_DAYS: i64 = 365;
const MAX_ESTIMATORS: usize = 10_000;

fn check_range<T>(key: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        bail!("Environment variable '{key}' must be between {min} and {max}, got {value}");
    }
    Ok(())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_optional_env(key)?.unwrap_or(default))
}

fn parse_optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_and_value() {
        std::env::remove_var("DIET_API_TEST_UNSET");
        assert_eq!(parse_env("DIET_API_TEST_UNSET", 7u16).unwrap(), 7);

        std::env::set_var("DIET_API_TEST_PORT", " 9090 ");
        assert_eq!(parse_env("DIET_API_TEST_PORT", 0u16).unwrap(), 9090);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("DIET_API_TEST_BOOL", "maybe");
        let err = parse_env("DIET_API_TEST_BOOL", false).unwrap_err();
        assert!(err.to_string().contains("DIET_API_TEST_BOOL"));
    }

    fn valid_config() -> Config {
        Config {
            database_url: "postgres://localhost/diet".to_string(),
            jwt_secret: "secret".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            access_token_ttl_minutes: 30,
            refresh_token_ttl_days: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            artifact_dir: PathBuf::from("./artifacts"),
            training: TrainingConfig::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let mut config = valid_config();
        config.training.forest.n_estimators = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TRAIN_N_ESTIMATORS"));
    }

    #[test]
    fn test_zero_max_depth_rejected() {
        let mut config = valid_config();
        config.training.forest.max_depth = Some(0);
        assert!(config.validate().unwrap_err().to_string().contains("TRAIN_MAX_DEPTH"));
        config.training.forest.max_depth = Some(8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bcrypt_cost_range() {
        let mut config = valid_config();
        for cost in [0, 3, 32] {
            config.bcrypt_cost = cost;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("BCRYPT_COST"), "{cost}");
        }
        config.bcrypt_cost = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_lifetimes_range() {
        let mut config = valid_config();
        for minutes in [-5, 0, i64::MAX] {
            config.access_token_ttl_minutes = minutes;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("ACCESS_TOKEN_EXPIRE_MINUTES"), "{minutes}");
        }
        config.access_token_ttl_minutes = 30;
        config.refresh_token_ttl_days = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("REFRESH_TOKEN_EXPIRE_DAYS"));
    }

    #[test]
    fn test_blank_jwt_secret_rejected() {
        let mut config = valid_config();
        config.jwt_secret = "   ".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_optional_env() {
        std::env::remove_var("DIET_API_TEST_DEPTH");
        assert_eq!(parse_optional_env::<usize>("DIET_API_TEST_DEPTH").unwrap(), None);
        std::env::set_var("DIET_API_TEST_DEPTH", "6");
        assert_eq!(parse_optional_env::<usize>("DIET_API_TEST_DEPTH").unwrap(), Some(6));
    }
}
