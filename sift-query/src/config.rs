//! Configuration file parsing for `sift.toml`.
//!
//! ```toml
//! [sql]
//! dialect = "mysql"
//! quote_identifiers = false
//!
//! [debug]
//! enabled = true
//! level = "trace"
//! format = "compact"
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::logging::{LogFormat, LogLevel};
use crate::sql::{DatabaseType, SqlOptions};

/// Main configuration structure for `sift.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiftConfig {
    /// SQL rendering settings.
    #[serde(default)]
    pub sql: SqlConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl SiftConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::invalid_configuration(format!("Cannot read {}", path.display())).with_source(e)
        })?;

        content.parse()
    }

    /// Options for the SQL translator.
    pub fn sql_options(&self) -> SqlOptions {
        SqlOptions::new(self.sql.dialect).quote_identifiers(self.sql.quote_identifiers)
    }
}

impl FromStr for SiftConfig {
    type Err = QueryError;

    fn from_str(content: &str) -> QueryResult<Self> {
        toml::from_str(content).map_err(|e| {
            QueryError::invalid_configuration(e.message().to_string())
                .with_help("See the `[sql]` and `[debug]` tables of sift.toml")
                .with_source(e)
        })
    }
}

/// SQL rendering configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqlConfig {
    /// Target dialect.
    #[serde(default)]
    pub dialect: DatabaseType,

    /// Quote reserved or unusual identifiers.
    #[serde(default = "default_true")]
    pub quote_identifiers: bool,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            dialect: DatabaseType::default(),
            quote_identifiers: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Same effect as `SIFT_DEBUG=true`.
    #[serde(default)]
    pub enabled: bool,

    /// Log level; `SIFT_LOG_LEVEL` wins when set.
    #[serde(default)]
    pub level: Option<LogLevel>,

    /// Output format; `SIFT_LOG_FORMAT` wins when set.
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config() {
        let config: SiftConfig = "".parse().unwrap();
        assert_eq!(config, SiftConfig::default());
        assert_eq!(config.sql_options(), SqlOptions::default());
    }

    #[test]
    fn test_full_config() {
        let config: SiftConfig = r#"
            [sql]
            dialect = "mssql"
            quote_identifiers = false

            [debug]
            enabled = true
            level = "trace"
            format = "pretty"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.sql.dialect, DatabaseType::MSSQL);
        assert!(!config.sql_options().quote_identifiers);
        assert!(config.debug.enabled);
        assert_eq!(config.debug.level, Some(LogLevel::Trace));
        assert_eq!(config.debug.format, LogFormat::Pretty);
    }

    #[test]
    fn test_dialect_alias() {
        let config: SiftConfig = "[sql]\ndialect = \"postgres\"".parse().unwrap();
        assert_eq!(config.sql.dialect, DatabaseType::PostgreSQL);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "[sql]\ndialect = \"sqlite\"\npool = 4".parse::<SiftConfig>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = "[sql]\ndialect = \"oracle\"".parse::<SiftConfig>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sql]\ndialect = \"mysql\"").unwrap();

        let config = SiftConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sql.dialect, DatabaseType::MySQL);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiftConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
        assert!(err.source.is_some());
    }
}
