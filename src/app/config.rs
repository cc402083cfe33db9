use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub assistant: AssistantConfig,
    pub polling: PollingConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub name: String,
    pub instructions: String,
    pub run_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                request_timeout_secs: 60,
            },
            assistant: AssistantConfig {
                name: "CSV Data Assistant".to_string(),
                instructions: "You are a helpful assistant. Users upload CSV files \
                               and based on that, you answer their questions."
                    .to_string(),
                run_instructions: "Please answer the queries using the knowledge \
                                   provided in the files."
                    .to_string(),
            },
            polling: PollingConfig {
                initial_interval_ms: 800,
                max_interval_ms: 5000,
                deadline_secs: 120,
            },
            ui: UiConfig {
                theme: "dark".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Loads the config file, writing defaults on first run.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, creating default configuration");
            let default_config = Self::default();
            default_config.save_to(path).await?;
            return Ok(default_config);
        }

        info!("Loading configuration from: {:?}", path);

        let config_content = fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&config_content)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        config.validate()?;

        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        info!("Saving configuration to: {:?}", path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let config_content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        fs::write(path, config_content).await?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.is_empty() {
            return Err(Error::validation("service.base_url must not be empty"));
        }
        if !self.service.base_url.starts_with("http") {
            return Err(Error::validation("service.base_url must be an http(s) URL"));
        }
        if self.service.model.is_empty() {
            return Err(Error::validation("service.model must not be empty"));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(Error::validation(
                "service.request_timeout_secs must be positive",
            ));
        }

        if self.assistant.name.is_empty() {
            return Err(Error::validation("assistant.name must not be empty"));
        }
        if self.assistant.instructions.is_empty() {
            return Err(Error::validation("assistant.instructions must not be empty"));
        }

        if self.polling.initial_interval_ms == 0 {
            return Err(Error::validation(
                "polling.initial_interval_ms must be positive",
            ));
        }
        if self.polling.max_interval_ms < self.polling.initial_interval_ms {
            return Err(Error::validation(
                "polling.max_interval_ms must not be below polling.initial_interval_ms",
            ));
        }
        if self.polling.deadline_secs == 0 {
            return Err(Error::validation("polling.deadline_secs must be positive"));
        }

        match self.ui.theme.as_str() {
            "dark" | "light" => Ok(()),
            other => Err(Error::validation(format!("unknown ui.theme: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.service.model, DEFAULT_MODEL);
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_validation_rejects_bad_polling() {
        let mut config = AppConfig::default();
        config.polling.max_interval_ms = config.polling.initial_interval_ms - 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.polling.deadline_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_service() {
        let mut config = AppConfig::default();
        config.service.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.service.model.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_theme() {
        let mut config = AppConfig::default();
        config.ui.theme = "matrix".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_creates_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.service.model, DEFAULT_MODEL);

        // Second load reads the file it just wrote.
        let reloaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(reloaded.service.base_url, config.service.base_url);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "service = 12").await.unwrap();

        assert!(AppConfig::load_from(&path).await.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.service.model, config.service.model);
        assert_eq!(parsed.assistant.instructions, config.assistant.instructions);
        assert_eq!(parsed.polling.deadline_secs, config.polling.deadline_secs);
    }
}
