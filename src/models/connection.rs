//! Connection-related data models.
//!
//! This module defines the supported database engines and helpers for
//! describing connection strings without leaking secrets.

use serde::{Deserialize, Serialize};
use url::Url;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Apache Derby. SQL is generated for it, but there is no Rust driver to execute it.
    Derby,
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    ///
    /// A leading `jdbc:` (as found in existing repox configuration files) is ignored.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        let lower = lower.strip_prefix("jdbc:").unwrap_or(&lower);
        if lower.starts_with("derby:") {
            Some(Self::Derby)
        } else if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Parse database type from a driver identifier.
    ///
    /// Accepts short names (`derby`, `mysql`, ...) as well as JDBC driver class
    /// names such as `org.apache.derby.jdbc.EmbeddedDriver`.
    pub fn from_driver(driver: &str) -> Option<Self> {
        let lower = driver.trim().to_lowercase();
        if lower.contains("derby") {
            Some(Self::Derby)
        } else if lower.contains("postgres") {
            Some(Self::PostgreSQL)
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            Some(Self::MySQL)
        } else if lower.contains("sqlite") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Derby => "Derby",
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Get a display-safe version of a connection string (credentials masked).
///
/// URLs are parsed so passwords containing `:` or `@` are masked whole. A
/// leading `jdbc:` is kept as-is.
pub fn masked_connection_string(connection_string: &str) -> String {
    let (jdbc, rest) = match connection_string.get(..5) {
        Some(p) if p.eq_ignore_ascii_case("jdbc:") => connection_string.split_at(5),
        _ => ("", connection_string),
    };

    if let Ok(mut url) = Url::parse(rest) {
        if url.password().is_none() {
            return connection_string.to_string();
        }
        if url.set_password(Some("****")).is_ok() {
            return format!("{jdbc}{url}");
        }
    }
    mask_user_info(connection_string)
}

/// Text fallback for strings the URL parser rejects: masks everything between
/// the first `:` of the user info and the last `@`.
fn mask_user_info(connection_string: &str) -> String {
    let start = connection_string.find("://").map(|p| p + 3).unwrap_or(0);
    let Some(at_pos) = connection_string.rfind('@').filter(|p| *p >= start) else {
        return connection_string.to_string();
    };
    match connection_string[start..at_pos].find(':') {
        Some(colon) => format!(
            "{}****{}",
            &connection_string[..start + colon + 1],
            &connection_string[at_pos..]
        ),
        None => connection_string.to_string(),
    }
}
