//! Environment-driven configuration.
//!
//! # Responsibility
//! - Read `CATALOG_*` variables into one typed `CatalogConfig`.
//! - Reject invalid values with the offending variable named.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - The token secret has no default; token operations ask for it through
//!   `CatalogConfig::token_secret`.

use crate::logging::default_log_level;
use crate::request::MutationPolicy;
use crate::service::author_resolution::AuthorCreationPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CATALOG_LOG_DIR";
pub const ENV_SECRET: &str = "CATALOG_SECRET";
pub const ENV_LOGIN_PASSWORD: &str = "CATALOG_LOGIN_PASSWORD";
pub const ENV_AUTHOR_POLICY: &str = "CATALOG_AUTHOR_POLICY";
pub const ENV_MUTATION_POLICY: &str = "CATALOG_MUTATION_POLICY";

const DEFAULT_DB_FILE_NAME: &str = "catalog.sqlite3";
const DEFAULT_LOGIN_PASSWORD: &str = "secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but its value is not accepted.
    InvalidValue { key: &'static str, reason: String },
    /// Variable is required for the requested operation but unset.
    Missing(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, reason } => write!(f, "invalid `{key}`: {reason}"),
            Self::Missing(key) => write!(f, "`{key}` must be set"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for one catalog process.
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; `None` disables file logging.
    pub log_dir: Option<String>,
    pub login_password: String,
    pub author_policy: AuthorCreationPolicy,
    pub mutation_policy: MutationPolicy,
    secret: Option<String>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("author_policy", &self.author_policy)
            .field("mutation_policy", &self.mutation_policy)
            .field("secret_set", &self.secret.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            login_password: DEFAULT_LOGIN_PASSWORD.to_string(),
            author_policy: AuthorCreationPolicy::default(),
            mutation_policy: MutationPolicy::default(),
            secret: None,
        }
    }
}

impl CatalogConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        config.log_dir = get(ENV_LOG_DIR).map(|dir| dir.trim().to_string());
        if let Some(password) = lookup(ENV_LOGIN_PASSWORD) {
            config.login_password = password;
        }
        if let Some(policy) = get(ENV_AUTHOR_POLICY) {
            config.author_policy = policy.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_AUTHOR_POLICY,
                reason,
            })?;
        }
        if let Some(policy) = get(ENV_MUTATION_POLICY) {
            config.mutation_policy = policy.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_MUTATION_POLICY,
                reason,
            })?;
        }
        config.secret = get(ENV_SECRET);

        Ok(config)
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// The token signing secret, required for login and bearer verification.
    pub fn token_secret(&self) -> Result<&str, ConfigError> {
        self.secret
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_SECRET))
    }
}
