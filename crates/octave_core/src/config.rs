//! Runtime configuration read from the process environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are rejected.
//! - `log_level` is always a normalized level name.

use crate::logging::{default_log_level, init_logging, normalize_level, normalize_log_dir};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "OCTAVE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "OCTAVE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "OCTAVE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file backing the document store; `None` keeps it in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads `OCTAVE_DB_PATH`, `OCTAVE_LOG_LEVEL` and `OCTAVE_LOG_DIR`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_level = match present(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };
        let log_dir = present(ENV_LOG_DIR)
            .map(|dir| normalize_log_dir(&dir))
            .transpose()?;
        let db_path = present(ENV_DB_PATH).map(|path| PathBuf::from(path.trim()));

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Starts file logging when a directory is configured.
    ///
    /// Returns whether logging was initialized.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", dir.display()))?;
        init_logging(self.log_level, dir)?;
        Ok(true)
    }
}
