use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::app::config::AppConfig;
use crate::assistant::AssistantClient;
use crate::error::Result;
use crate::platform::{AppPaths, SecureStorageManager};

pub struct AppState {
    config: Arc<RwLock<AppConfig>>,
    config_path: PathBuf,
    paths: AppPaths,
    secure_storage: SecureStorageManager,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        config_path: PathBuf,
        paths: AppPaths,
        secure_storage: SecureStorageManager,
    ) -> Self {
        info!("Initializing application state");

        Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            paths,
            secure_storage,
        }
    }

    pub fn get_config(&self) -> AppConfig {
        self.config.read().clone()
    }

    pub async fn update_config<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        debug!("Updating application configuration");

        {
            let mut config = self.config.write();
            updater(&mut config);
            config.validate()?;
        }

        let config = self.config.read().clone();
        config.save_to(&self.config_path).await?;

        info!("Configuration updated and saved");
        Ok(())
    }

    pub async fn get_api_key(&self) -> Result<Option<String>> {
        self.secure_storage.retrieve_api_key().await
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<()> {
        self.secure_storage.store_api_key(api_key).await
    }

    pub async fn remove_api_key(&self) -> Result<()> {
        self.secure_storage.delete_api_key().await
    }

    pub fn get_paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Builds a service client from the stored key, or None when no key is set.
    pub async fn build_client(&self) -> Result<Option<AssistantClient>> {
        match self.get_api_key().await? {
            Some(api_key) if !api_key.is_empty() => {
                let config = self.get_config();
                let client = AssistantClient::with_base_url(
                    api_key,
                    config.service.base_url.clone(),
                    config.service.request_timeout_secs,
                )?;
                Ok(Some(client))
            }
            _ => Ok(None),
        }
    }

    /// Probes the service with the stored key. Ok(false) covers both a
    /// missing key and one the service rejects.
    pub async fn validate_credentials(&self) -> Result<bool> {
        match self.build_client().await? {
            Some(client) => match client.validate_key().await {
                Ok(()) => {
                    debug!("Stored credentials accepted by the service");
                    Ok(true)
                }
                Err(e) => {
                    debug!("Stored credentials rejected: {}", e);
                    Ok(false)
                }
            },
            None => {
                debug!("No API key stored");
                Ok(false)
            }
        }
    }

    pub async fn credential_status(&self) -> Result<CredentialStatus> {
        match self.get_api_key().await? {
            None => Ok(CredentialStatus::Missing),
            Some(key) if key.is_empty() => Ok(CredentialStatus::Missing),
            Some(_) => {
                if self.validate_credentials().await? {
                    Ok(CredentialStatus::Ready)
                } else {
                    Ok(CredentialStatus::Rejected)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialStatus {
    Ready,
    Missing,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_status_enum() {
        assert_eq!(CredentialStatus::Ready, CredentialStatus::Ready);
        assert_ne!(CredentialStatus::Missing, CredentialStatus::Rejected);
    }
}
