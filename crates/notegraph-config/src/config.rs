//! Configuration types

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for a notegraph instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotegraphConfig {
    /// Object store settings.
    pub storage: StorageConfig,
    /// Graph loading and on-disk layout settings.
    pub graph: GraphConfig,
    /// Search engine settings.
    pub search: SearchConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Object store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the filesystem object store.
    pub root: PathBuf,
    /// Upper bound on concurrently open file handles.
    pub max_open_files: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./notegraph-data"),
            max_open_files: 64,
        }
    }
}

/// Graph loading and on-disk layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Worker threads used to parse notes during a cold load.
    ///
    /// `None` sizes the pool to the available hardware concurrency.
    pub parse_workers: Option<usize>,
    /// Extension of note, alias and file sidecar objects.
    pub note_extension: String,
    /// Object name of the pins list.
    pub pins_object: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            parse_workers: None,
            note_extension: ".subtext".to_string(),
            pins_object: ".pin-list.txt".to_string(),
        }
    }
}

impl GraphConfig {
    /// Effective number of parse workers.
    pub fn effective_parse_workers(&self) -> usize {
        self.parse_workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Search engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results per page.
    pub page_size: usize,
    /// Whether default substring matching is case sensitive.
    pub case_sensitive: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            case_sensitive: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `notegraph_core=debug`.
    pub level: String,
    /// Include the event target in log lines.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

impl NotegraphConfig {
    /// Check that every field holds a usable value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.page_size == 0 {
            return Err(ConfigError::Validation(
                "search.page_size must be greater than 0".to_string(),
            ));
        }
        if self.storage.max_open_files == 0 {
            return Err(ConfigError::Validation(
                "storage.max_open_files must be greater than 0".to_string(),
            ));
        }
        if self.graph.parse_workers == Some(0) {
            return Err(ConfigError::Validation(
                "graph.parse_workers must be greater than 0".to_string(),
            ));
        }
        if !self.graph.note_extension.starts_with('.') || self.graph.note_extension.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "graph.note_extension must start with '.': {}",
                self.graph.note_extension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NotegraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.page_size, 100);
        assert_eq!(config.graph.note_extension, ".subtext");
        assert!(config.graph.effective_parse_workers() >= 1);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = NotegraphConfig::default();
        config.search.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = NotegraphConfig::default();
        config.graph.parse_workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = NotegraphConfig::default();
        config.graph.note_extension = "subtext".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_parse_workers() {
        let config = GraphConfig {
            parse_workers: Some(3),
            ..Default::default()
        };
        assert_eq!(config.effective_parse_workers(), 3);
    }
}
