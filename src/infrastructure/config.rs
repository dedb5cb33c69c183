use std::env;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Lesson completion threshold when none is configured
pub const DEFAULT_COMPLETION_THRESHOLD: i32 = 90;
/// Number of coin transactions shown on the dashboard by default
pub const DEFAULT_RECENT_TRANSACTIONS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set in production")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub cors_allowed_origins: Vec<String>,
    /// Percentage of a lesson that must be watched to complete it
    pub lesson_completion_threshold: i32,
    pub dashboard_recent_transactions: u64,
    /// Grade short-answer and fill-in-the-blank questions against accepted answers
    pub grade_text_answers: bool,
    pub seed_demo: bool,
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(cfg!(debug_assertions))
    }

    /// Reads the environment; without `allow_dev_secret` a missing or blank
    /// `JWT_SECRET` is an error, since an empty HMAC key signs anything.
    pub fn from_env_with(allow_dev_secret: bool) -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://lms.db?mode=rwc".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if allow_dev_secret => "secret".to_string(),
            _ => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        Ok(Self {
            database_url,
            port: parsed("PORT").unwrap_or(8080),
            jwt_secret: SecretString::new(jwt_secret),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(Vec::new),
            lesson_completion_threshold: parsed("LESSON_COMPLETION_THRESHOLD")
                .filter(|t: &i32| (1..=100).contains(t))
                .unwrap_or(DEFAULT_COMPLETION_THRESHOLD),
            dashboard_recent_transactions: parsed("DASHBOARD_RECENT_TRANSACTIONS")
                .unwrap_or(DEFAULT_RECENT_TRANSACTIONS),
            grade_text_answers: flag("GRADE_TEXT_ANSWERS"),
            seed_demo: flag("SEED_DEMO"),
        })
    }

    /// Defaults for an in-memory database, used by tests and tooling
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            port: 8080,
            jwt_secret: SecretString::new("secret".to_string()),
            cors_allowed_origins: Vec::new(),
            lesson_completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            dashboard_recent_transactions: DEFAULT_RECENT_TRANSACTIONS,
            grade_text_answers: false,
            seed_demo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "PORT",
        "JWT_SECRET",
        "CORS_ALLOWED_ORIGINS",
        "LESSON_COMPLETION_THRESHOLD",
        "DASHBOARD_RECENT_TRANSACTIONS",
        "GRADE_TEXT_ANSWERS",
        "SEED_DEMO",
    ];

    fn clear() {
        for key in KEYS {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults_without_environment() {
        clear();
        let config = Config::from_env_with(true).unwrap();
        assert_eq!(config.jwt_secret.expose_secret(), "secret");
        assert_eq!(config.database_url, "sqlite://lms.db?mode=rwc");
        assert_eq!(config.port, 8080);
        assert_eq!(config.lesson_completion_threshold, 90);
        assert_eq!(config.dashboard_recent_transactions, 5);
        assert!(config.cors_allowed_origins.is_empty());
        assert!(!config.grade_text_answers);
        assert!(!config.seed_demo);
    }

    #[test]
    #[serial]
    fn reads_environment_and_ignores_garbage() {
        clear();
        unsafe {
            env::set_var("PORT", "9000");
            env::set_var("JWT_SECRET", "s3cret");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
            env::set_var("LESSON_COMPLETION_THRESHOLD", "250");
            env::set_var("DASHBOARD_RECENT_TRANSACTIONS", "ten");
            env::set_var("SEED_DEMO", "true");
        }

        let config = Config::from_env_with(false).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.lesson_completion_threshold, 90);
        assert_eq!(config.dashboard_recent_transactions, 5);
        assert!(config.seed_demo);
        clear();
    }

    #[test]
    #[serial]
    fn production_requires_jwt_secret() {
        clear();
        assert_eq!(
            Config::from_env_with(false).err(),
            Some(ConfigError::Missing("JWT_SECRET"))
        );

        unsafe { env::set_var("JWT_SECRET", "  ") };
        assert_eq!(
            Config::from_env_with(false).err(),
            Some(ConfigError::Missing("JWT_SECRET"))
        );
        clear();
    }
}
