/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "REWIND_CONFIG";

const CONFIG_FILE_NAME: &str = "rewind.json";

const DEFAULT_LOG_FILTER: &str = "info";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Max undo steps kept per document. 0 = unbounded.
    pub max_undo_depth: usize,
    /// Pretty-print JSON output.
    pub pretty_output: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_undo_depth: 0,
            pretty_output: true,
        }
    }
}

impl AppConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `REWIND_CONFIG` environment variable
    /// 2. `rewind/rewind.json` under the user's config directory
    /// 3. `rewind.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|d| d.join("rewind").join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Keep the broken file for the user to fix.
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Resets invalid fields.
    pub fn sanitize(&mut self) {
        let trimmed = self.log_filter.trim();
        self.log_filter = if trimmed.is_empty() {
            DEFAULT_LOG_FILTER.to_string()
        } else {
            trimmed.to_string()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.max_undo_depth, 0);
        assert!(config.pretty_output);
    }

    #[test]
    fn test_sanitize_resets_blank_filter() {
        let mut config = AppConfig {
            log_filter: "   ".to_string(),
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_sanitize_trims_filter() {
        let mut config = AppConfig {
            log_filter: " rewind=debug ".to_string(),
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.log_filter, "rewind=debug");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let parsed: AppConfig = serde_json::from_str(r#"{"max_undo_depth": 50}"#).unwrap();
        assert_eq!(parsed.max_undo_depth, 50);
        assert_eq!(parsed.log_filter, "info");
        assert!(parsed.pretty_output);
    }

    // One test for both cases: they share the process environment.
    #[test]
    fn test_config_path_resolution() {
        let saved = std::env::var(CONFIG_ENV_VAR).ok();

        std::env::set_var(CONFIG_ENV_VAR, "/custom/rewind.json");
        assert_eq!(AppConfig::config_path(), PathBuf::from("/custom/rewind.json"));

        std::env::remove_var(CONFIG_ENV_VAR);
        let fallback = AppConfig::config_path();
        let expected = match dirs::config_dir() {
            Some(dir) => dir.join("rewind").join(CONFIG_FILE_NAME),
            None => PathBuf::from(CONFIG_FILE_NAME),
        };
        assert_eq!(fallback, expected);

        match saved {
            Some(value) => std::env::set_var(CONFIG_ENV_VAR, value),
            None => std::env::remove_var(CONFIG_ENV_VAR),
        }
    }
}
