use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const KEYCHAIN_SERVICE: &str = "io.csvchat.credentials";
const API_KEY_ENTRY: &str = "api_key";

#[async_trait]
pub trait SecureStorage: Send + Sync {
    async fn store(&self, service: &str, key: &str, value: &str) -> Result<()>;
    async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>>;
    async fn delete(&self, service: &str, key: &str) -> Result<()>;
}

pub struct SecureStorageManager {
    backend: Box<dyn SecureStorage>,
}

impl SecureStorageManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            backend: Box::new(KeyringStorage),
        })
    }

    #[cfg(test)]
    fn with_backend(backend: Box<dyn SecureStorage>) -> Self {
        Self { backend }
    }

    /// Stores the hosted service API key in the OS keychain.
    pub async fn store_api_key(&self, key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::validation("API key must not be empty"));
        }

        let result = self
            .backend
            .store(KEYCHAIN_SERVICE, API_KEY_ENTRY, key)
            .await;

        match &result {
            Ok(_) => debug!("Stored API key in secure storage"),
            Err(_) => warn!("Failed to store API key in secure storage"),
        }

        result
    }

    pub async fn retrieve_api_key(&self) -> Result<Option<String>> {
        let result = self.backend.retrieve(KEYCHAIN_SERVICE, API_KEY_ENTRY).await;

        match &result {
            Ok(Some(_)) => debug!("Retrieved API key from secure storage"),
            Ok(None) => debug!("No API key present in secure storage"),
            Err(_) => warn!("Failed to retrieve API key from secure storage"),
        }

        result
    }

    pub async fn delete_api_key(&self) -> Result<()> {
        let result = self.backend.delete(KEYCHAIN_SERVICE, API_KEY_ENTRY).await;

        match &result {
            Ok(_) => debug!("Deleted API key from secure storage"),
            Err(_) => warn!("Failed to delete API key from secure storage"),
        }

        result
    }
}

// Cross-platform storage implementation using keyring
pub struct KeyringStorage;

#[async_trait]
impl SecureStorage for KeyringStorage {
    async fn store(&self, service: &str, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(service, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(service, key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::SecureStorage(e)),
        }
    }

    async fn delete(&self, service: &str, key: &str) -> Result<()> {
        let entry = Entry::new(service, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::SecureStorage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        entries: Mutex<HashMap<(String, String), String>>,
    }

    #[async_trait]
    impl SecureStorage for MemoryStorage {
        async fn store(&self, service: &str, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .insert((service.to_string(), key.to_string()), value.to_string());
            Ok(())
        }

        async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>> {
            Ok(self
                .entries
                .lock()
                .get(&(service.to_string(), key.to_string()))
                .cloned())
        }

        async fn delete(&self, service: &str, key: &str) -> Result<()> {
            self.entries
                .lock()
                .remove(&(service.to_string(), key.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_retrieve_delete_roundtrip() {
        let manager = SecureStorageManager::with_backend(Box::new(MemoryStorage::default()));

        assert_eq!(manager.retrieve_api_key().await.unwrap(), None);

        manager.store_api_key("sk-test-123").await.unwrap();
        assert_eq!(
            manager.retrieve_api_key().await.unwrap(),
            Some("sk-test-123".to_string())
        );

        manager.delete_api_key().await.unwrap();
        assert_eq!(manager.retrieve_api_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let manager = SecureStorageManager::with_backend(Box::new(MemoryStorage::default()));
        let result = manager.store_api_key("   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
