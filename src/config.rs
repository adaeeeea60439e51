use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::StorefrontError;

/// Main configuration structure for the storefront
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub name: String,
    /// Base URL of the placeholder image service
    pub image_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Client-side cap on one request. The service enforces none of its own
    /// that the shell can rely on, so a hung call would otherwise block input.
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "Whose Books".to_string(),
            image_base_url: "https://picsum.photos".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = [".env", "../.env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::debug!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("WHOSE_BOOKS_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::from_yaml_str(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        // Log warnings but don't fail; the shop still works without the librarian
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in production)
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("WHOSE_BOOKS_STORE_NAME") {
            self.store.name = name;
        }
        if let Some(base) = lookup("WHOSE_BOOKS_IMAGE_BASE_URL") {
            self.store.image_base_url = base;
        }

        // Gemini overrides; API_KEY is the name the web build used
        if let Some(api_key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            self.gemini.api_key = api_key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = base_url;
        }
        if let Some(timeout) = lookup("GEMINI_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.gemini.timeout_seconds = secs,
                Err(_) => tracing::warn!("Ignoring invalid GEMINI_TIMEOUT_SECS: {}", timeout),
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), StorefrontError> {
        let invalid =
            |msg: String| -> Result<(), StorefrontError> { Err(StorefrontError::Config(msg)) };
        if self.gemini.api_key.trim().is_empty() {
            return invalid("GEMINI_API_KEY must be set for the AI librarian".to_string());
        }
        if self.gemini.model.trim().is_empty() {
            return invalid("Gemini model cannot be empty".to_string());
        }
        if self.gemini.timeout_seconds == 0 {
            return invalid("Gemini timeout_seconds cannot be 0".to_string());
        }
        if !self.store.image_base_url.starts_with("http") {
            return invalid(format!(
                "store.image_base_url must be an http(s) URL, got '{}'",
                self.store.image_base_url
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_fail_validation_without_key() {
        let cfg = Config::default();
        assert_eq!(cfg.gemini.model, "gemini-2.5-flash");
        assert_eq!(cfg.gemini.timeout(), Duration::from_secs(30));
        match cfg.validate() {
            Err(StorefrontError::Config(msg)) => assert!(msg.contains("GEMINI_API_KEY")),
            other => panic!("unexpected validation result: {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_is_config_error() {
        let mut cfg = Config::default();
        cfg.gemini.api_key = "k".to_string();
        cfg.gemini.timeout_seconds = 0;
        assert!(matches!(cfg.validate(), Err(StorefrontError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml_str("gemini:\n  model: gemini-2.0-pro\n").unwrap();
        assert_eq!(cfg.gemini.model, "gemini-2.0-pro");
        assert_eq!(cfg.gemini.timeout_seconds, 30);
        assert_eq!(cfg.store.name, "Whose Books");
    }

    #[test]
    fn test_overrides_apply_and_validate() {
        let mut cfg = Config::default();
        cfg.apply_overrides(lookup_from(&[
            ("API_KEY", "legacy-key"),
            ("GEMINI_MODEL", "gemini-test"),
            ("GEMINI_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(cfg.gemini.api_key, "legacy-key");
        assert_eq!(cfg.gemini.model, "gemini-test");
        assert_eq!(cfg.gemini.timeout_seconds, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_gemini_key_wins_over_legacy_name() {
        let mut cfg = Config::default();
        cfg.apply_overrides(lookup_from(&[
            ("API_KEY", "legacy-key"),
            ("GEMINI_API_KEY", "primary-key"),
        ]));
        assert_eq!(cfg.gemini.api_key, "primary-key");
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides(lookup_from(&[("GEMINI_TIMEOUT_SECS", "soon")]));
        assert_eq!(cfg.gemini.timeout_seconds, 30);
    }
}
