use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-collection query guard rails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Upper bound applied to an explicit `limit`.
    pub max_limit: usize,
    pub max_sort_fields: usize,
    pub max_projection_fields: usize,
    /// Maximum nesting of `and`/`or` combinators.
    pub max_filter_depth: usize,
    /// Queries at or above this duration are counted and logged as slow.
    pub slow_query_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_limit: 10_000,
            max_sort_fields: 8,
            max_projection_fields: 64,
            max_filter_depth: 32,
            slow_query_ms: 500,
        }
    }
}

impl QueryConfig {
    /// # Errors
    /// Returns an error if the TOML is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Applies `RECORDLITE_MAX_LIMIT` and `RECORDLITE_SLOW_QUERY_MS` when set and valid.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<usize>("RECORDLITE_MAX_LIMIT") {
            self.max_limit = v;
        }
        if let Some(v) = env_parse::<u64>("RECORDLITE_SLOW_QUERY_MS") {
            self.slow_query_ms = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        log::warn!("ignoring invalid {key}={raw}");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = QueryConfig::from_toml_str("max_limit = 50\nslow_query_ms = 5\n").unwrap();
        assert_eq!(c.max_limit, 50);
        assert_eq!(c.slow_query_ms, 5);
        assert_eq!(c.max_sort_fields, QueryConfig::default().max_sort_fields);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(QueryConfig::from_toml_str("").unwrap(), QueryConfig::default());
    }

    #[test]
    fn bad_types_are_errors() {
        assert!(matches!(
            QueryConfig::from_toml_str("max_limit = \"lots\""),
            Err(DbError::Toml(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("query.toml");
        std::fs::write(&p, "max_filter_depth = 4\n").unwrap();
        assert_eq!(QueryConfig::load(&p).unwrap().max_filter_depth, 4);
        assert!(matches!(
            QueryConfig::load(&dir.path().join("missing.toml")),
            Err(DbError::Config(_))
        ));
    }
}
