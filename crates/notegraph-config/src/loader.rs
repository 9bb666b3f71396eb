//! Loading configuration from files and the environment

use crate::config::NotegraphConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::debug;

/// Environment variable overriding [`crate::StorageConfig::root`]
pub const ENV_ROOT: &str = "NOTEGRAPH_ROOT";
/// Environment variable overriding [`crate::SearchConfig::page_size`]
pub const ENV_PAGE_SIZE: &str = "NOTEGRAPH_PAGE_SIZE";
/// Environment variable overriding [`crate::LoggingConfig::level`]
pub const ENV_LOG_LEVEL: &str = "NOTEGRAPH_LOG_LEVEL";

impl NotegraphConfig {
    /// Load and validate configuration from a TOML or JSON file.
    ///
    /// The format is picked from the file extension.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&raw)?,
            Some("json") => Self::from_json_str(&raw)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from a TOML document.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON document.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NOTEGRAPH_*` environment overrides and re-validate.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT) {
            self.storage.root = root.into();
        }
        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            self.search.page_size = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_PAGE_SIZE.to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = NotegraphConfig::from_toml_str(
            r#"
            [search]
            page_size = 25

            [graph]
            parse_workers = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.search.page_size, 25);
        assert!(!config.search.case_sensitive);
        assert_eq!(config.graph.parse_workers, Some(2));
        assert_eq!(config.graph.pins_object, ".pin-list.txt");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml_value_is_rejected() {
        let result = NotegraphConfig::from_toml_str("[search]\npage_size = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notegraph.json");
        tokio::fs::write(&path, r#"{"storage": {"root": "/data/notes"}}"#)
            .await
            .unwrap();

        let config = NotegraphConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/data/notes"));
        assert_eq!(config.storage.max_open_files, 64);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notegraph.ini");
        tokio::fs::write(&path, "").await.unwrap();

        let result = NotegraphConfig::load_from_file(&path).await;
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = NotegraphConfig::load_from_file("/nonexistent/notegraph.toml").await;
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ROOT, "/tmp/graph"),
            (ENV_PAGE_SIZE, "10"),
            (ENV_LOG_LEVEL, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = NotegraphConfig::default();
        config
            .apply_overrides(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.storage.root, PathBuf::from("/tmp/graph"));
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_override_with_bad_number() {
        let mut config = NotegraphConfig::default();
        let result = config.apply_overrides(|var| {
            (var == ENV_PAGE_SIZE).then(|| "many".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }
}
