//! Configuration management

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};
use crate::core::store::{load_api_key, KeyValueStore};

/// Default chat-completion endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Config file looked up in the working directory (any supported extension)
pub const DEFAULT_CONFIG_NAME: &str = "translator";

/// File name of the local settings store
pub const SETTINGS_FILE_NAME: &str = "translator-settings.json";

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_output_tokens() -> u32 {
    3000
}

fn default_timeout_ms() -> u64 {
    60_000
}

/// Per-user settings file, falling back to the working directory when the
/// platform has no home directory
fn default_store_path() -> PathBuf {
    ProjectDirs::from("com", "chatgpt-translator", "chatgpt-translator")
        .map(|dirs| dirs.data_dir().join(SETTINGS_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME))
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_endpoint: default_endpoint(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            timeout_ms: default_timeout_ms(),
            store_path: default_store_path(),
        }
    }
}

impl TranslatorConfig {
    /// Load from `translator.{json,toml,yaml}` (optional) and `TRANSLATOR_*`
    /// environment variables. `OPENAI_API_KEY` overrides the key.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load with an explicit config file name
    pub fn load_from(name: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(name).required(false))
            .add_source(::config::Environment::with_prefix("TRANSLATOR").try_parsing(true))
            .build()?;

        let mut config: Self = settings.try_deserialize()?;

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.trim().is_empty() {
                config.api_key = api_key;
            }
        }

        debug!(
            "Loaded config: endpoint={}, model={}, store={}",
            config.api_endpoint,
            config.model,
            config.store_path.display()
        );

        Ok(config)
    }

    /// Fill an empty key from the credential saved in the settings store
    pub fn with_saved_key(mut self, store: &dyn KeyValueStore) -> Result<Self> {
        if self.api_key.trim().is_empty() {
            if let Some(saved) = load_api_key(store)? {
                info!("Using API key from settings store");
                self.api_key = saved;
            }
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TranslationError::MissingApiKey);
        }

        if self.api_endpoint.is_empty() {
            return Err(TranslationError::ConfigError {
                message: "API endpoint is required".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(TranslationError::ConfigError {
                message: "model is required".to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(TranslationError::ConfigError {
                message: "timeout_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{save_api_key, MemoryStore};

    #[test]
    fn test_config_validation() {
        let config = TranslatorConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_key() {
        let config = TranslatorConfig::default();
        assert!(matches!(
            config.validate(),
            Err(TranslationError::MissingApiKey)
        ));
    }

    #[test]
    fn test_saved_key_fills_gap() {
        let store = MemoryStore::new();
        save_api_key(&store, "sk-saved").unwrap();

        let config = TranslatorConfig::default().with_saved_key(&store).unwrap();
        assert_eq!(config.api_key, "sk-saved");

        let config = TranslatorConfig {
            api_key: "sk-explicit".to_string(),
            ..Default::default()
        }
        .with_saved_key(&store)
        .unwrap();
        assert_eq!(config.api_key, "sk-explicit");
    }

    #[test]
    fn test_load_from_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("translator.json"),
            r#"{"model":"gpt-4o-mini","timeout_ms":5000}"#,
        )
        .unwrap();

        let name = dir.path().join("translator");
        let config = TranslatorConfig::load_from(name.to_str().unwrap()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.api_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_output_tokens, 3000);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("absent");
        let config = TranslatorConfig::load_from(name.to_str().unwrap()).unwrap();
        assert_eq!(config.api_endpoint, DEFAULT_ENDPOINT);
        assert!(config.store_path.ends_with(SETTINGS_FILE_NAME));
    }
}
