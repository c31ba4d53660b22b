//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `SOMTAM_DATABASE_PATH` | `<platform data dir>/somtam.db` |
//! | `SOMTAM_UTC_OFFSET_MINUTES` | `420` (Asia/Bangkok) |
//! | `SOMTAM_MAX_CONNECTIONS` | `5` |

use chrono::{FixedOffset, Offset, Utc};
use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

use somtam_db::DbConfig;

pub const ENV_DATABASE_PATH: &str = "SOMTAM_DATABASE_PATH";
pub const ENV_UTC_OFFSET_MINUTES: &str = "SOMTAM_UTC_OFFSET_MINUTES";
pub const ENV_MAX_CONNECTIONS: &str = "SOMTAM_MAX_CONNECTIONS";

/// Shop-local time used for order numbers, day buckets and the daily cache.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DATABASE_FILE: &str = "somtam.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub database_path: PathBuf,

    /// Minutes east of UTC.
    pub utc_offset_minutes: i32,

    pub max_connections: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: default_database_path(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::load`] over any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup(ENV_DATABASE_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            utc_offset_minutes: match lookup(ENV_UTC_OFFSET_MINUTES) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_UTC_OFFSET_MINUTES.to_string()))?,
                None => defaults.utc_offset_minutes,
            },

            max_connections: match lookup(ENV_MAX_CONNECTIONS) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()))?,
                None => defaults.max_connections,
            },
        };

        // chrono accepts strictly less than a day either way
        if config.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue(ENV_UTC_OFFSET_MINUTES.to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }

        Ok(config)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

/// Platform data directory, or the working directory when there is none.
///
/// - **macOS**: `~/Library/Application Support/com.somtam.pos/somtam.db`
/// - **Windows**: `%APPDATA%\somtam\pos\data\somtam.db`
/// - **Linux**: `~/.local/share/pos/somtam.db`
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "somtam", "pos")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.utc_offset_minutes, 420);
        assert_eq!(config.max_connections, 5);
        assert!(config.database_path.ends_with("somtam.db"));
        assert_eq!(config.utc_offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ENV_DATABASE_PATH, "/tmp/shop.db"),
            (ENV_UTC_OFFSET_MINUTES, "-300"),
            (ENV_MAX_CONNECTIONS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.utc_offset().local_minus_utc(), -5 * 3600);
        assert_eq!(config.db_config().max_connections, 2);
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            [(ENV_UTC_OFFSET_MINUTES, "seven")],
            [(ENV_UTC_OFFSET_MINUTES, "1440")],
            [(ENV_MAX_CONNECTIONS, "0")],
        ] {
            assert!(matches!(
                ServiceConfig::from_lookup(lookup(&pairs)),
                Err(ConfigError::InvalidValue(_))
            ));
        }
    }
}
