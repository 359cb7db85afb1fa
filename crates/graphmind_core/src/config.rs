//! Runtime configuration and vault assembly.
//!
//! # Responsibility
//! - Resolve store backend, logging and history settings from the
//!   environment (or any key lookup).
//! - Build a ready-to-use [`Vault`] from a resolved config.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults; malformed ones are errors.
//! - The SQLite backend shares one migrated connection between the item
//!   store and the history log.

use crate::db::{open_shared, DbError};
use crate::logging::{
    default_log_level, init_logging, normalize_level, normalize_log_dir, LoggingError,
};
use crate::repo::history_repo::{
    normalize_history_limit, InMemoryHistoryLog, SqliteHistoryLog, HISTORY_DEFAULT_LIMIT,
};
use crate::repo::sqlite_vault_repo::SqliteVaultRepository;
use crate::repo::vault_repo::{InMemoryVaultRepository, RepoError, VaultRepository};
use crate::service::vault_service::VaultService;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "GRAPHMIND_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "GRAPHMIND_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GRAPHMIND_LOG_DIR";
pub const ENV_HISTORY_LIMIT: &str = "GRAPHMIND_HISTORY_LIMIT";

/// Vault service over whichever backend the config selected.
pub type Vault = VaultService<Box<dyn VaultRepository>>;

/// Where vault items and history events live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local maps; contents vanish with the process.
    Memory,
    /// SQLite database file, created and migrated on open.
    Sqlite(PathBuf),
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Logging(LoggingError),
    InvalidHistoryLimit(String),
    Store(RepoError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::InvalidHistoryLimit(value) => write!(
                f,
                "invalid {ENV_HISTORY_LIMIT} `{value}`; expected an integer, clamped to 1..=200"
            ),
            Self::Store(err) => write!(f, "cannot open vault store: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::InvalidHistoryLimit(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<RepoError> for ConfigError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphmindConfig {
    pub store: StoreBackend,
    pub log_level: &'static str,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Default history query cap, already clamped.
    pub history_limit: u32,
}

impl Default for GraphmindConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            log_level: default_log_level(),
            log_dir: None,
            history_limit: HISTORY_DEFAULT_LIMIT,
        }
    }
}

impl GraphmindConfig {
    /// Reads the `GRAPHMIND_*` process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let store = match value(ENV_DB_PATH) {
            Some(path) => StoreBackend::Sqlite(PathBuf::from(path)),
            None => StoreBackend::Memory,
        };
        let log_level = match value(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };
        let log_dir = value(ENV_LOG_DIR)
            .map(|dir| normalize_log_dir(&dir))
            .transpose()?;
        let history_limit = match value(ENV_HISTORY_LIMIT) {
            Some(raw) => {
                let parsed = raw
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidHistoryLimit(raw.clone()))?;
                normalize_history_limit(Some(parsed))
            }
            None => HISTORY_DEFAULT_LIMIT,
        };

        Ok(Self {
            store,
            log_level,
            log_dir,
            history_limit,
        })
    }

    /// Starts file logging when a directory is configured.
    ///
    /// Returns whether logging was requested.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        let Some(dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(self.log_level, &dir.to_string_lossy())?;
        Ok(true)
    }
}

/// Builds the store, history log and service described by `config`.
pub fn open_vault(config: &GraphmindConfig) -> Result<Vault, ConfigError> {
    let vault = match &config.store {
        StoreBackend::Memory => {
            let repo: Box<dyn VaultRepository> = Box::new(InMemoryVaultRepository::new());
            VaultService::new(repo).with_history(Box::new(InMemoryHistoryLog::new()))
        }
        StoreBackend::Sqlite(path) => {
            let conn = open_shared(path)?;
            let repo: Box<dyn VaultRepository> =
                Box::new(SqliteVaultRepository::try_new(conn.clone())?);
            VaultService::new(repo).with_history(Box::new(SqliteHistoryLog::try_new(conn)?))
        }
    };

    info!(
        "event=vault_open module=config status=ok backend={} history_limit={}",
        config.store.as_str(),
        config.history_limit
    );
    Ok(vault.with_history_limit(config.history_limit))
}
