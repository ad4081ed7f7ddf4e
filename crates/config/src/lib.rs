//! # Config - MDBL Runtime Settings
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! MDBL_ROOT            parent directory of databases     (default: ".")
//! MDBL_DATABASE        database name                     (default: "MDBL")
//! MDBL_REQUIRE_FIELDS  reject tables with zero fields    (default: "true")
//! MDBL_SYNC            fsync every registry write        (default: "true")
//! MDBL_LOG             log filter for the shell          (default: "warn")
//! ```
//!
//! Values that fail to parse fall back to their default rather than aborting
//! startup. A database name outside `[A-Za-z0-9_-]` counts as unparseable.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Database name used when `MDBL_DATABASE` is unset or empty.
pub const DEFAULT_DATABASE_NAME: &str = "MDBL";

/// Default log filter when neither `MDBL_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

static DATABASE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid regex"));

/// `true` if `name` is usable as a database folder name.
pub fn is_valid_database_name(name: &str) -> bool {
    DATABASE_NAME_REGEX.is_match(name)
}

/// Resolved settings for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory that holds the database folder.
    pub root: PathBuf,
    /// Name of the database folder under `root`.
    pub database: String,
    /// If `true`, `CREATE` refuses tables without fields.
    pub require_fields: bool,
    /// If `true`, registry writes are followed by `fsync`.
    pub sync: bool,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            database: DEFAULT_DATABASE_NAME.to_string(),
            require_fields: true,
            sync: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Tests use this to avoid mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let root = non_empty("MDBL_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root);
        let database = non_empty("MDBL_DATABASE")
            .map(|v| v.trim().to_string())
            .filter(|v| is_valid_database_name(v))
            .unwrap_or(defaults.database);
        let require_fields = non_empty("MDBL_REQUIRE_FIELDS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.require_fields);
        let sync = non_empty("MDBL_SYNC")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.sync);
        let log_filter = non_empty("MDBL_LOG")
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or(defaults.log_filter);

        Self {
            root,
            database,
            require_fields,
            sync,
            log_filter,
        }
    }

    /// Returns `<root>/<database>`.
    #[must_use]
    pub fn database_dir(&self) -> PathBuf {
        self.root.join(&self.database)
    }

    /// Returns the configured root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests;
