//! In-memory key-value storage adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].  Stands in for the
//! platform preference file / on-device database in host builds, tests
//! and simulations.
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespace isolation: each subsystem uses its own namespace prefix.
//! - Atomic writes: a write replaces the whole value under one borrow.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::EngineConfig;

const CONFIG_NAMESPACE: &str = "steppet";
const CONFIG_KEY: &str = "engcfg";

#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        info!("MemoryStorage: in-memory backend");
        Self::default()
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl ConfigPort for MemoryStorage {
    fn load(&self) -> Result<EngineConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: EngineConfig =
                postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            info!("MemoryStorage: loaded config from store");
            Ok(cfg)
        } else {
            info!("MemoryStorage: no stored config, using defaults");
            Ok(EngineConfig::default())
        }
    }

    fn save(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("MemoryStorage: rejected config: {}", e);
            return Err(e);
        }
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.store.borrow_mut().insert(key, bytes);
        info!("MemoryStorage: config saved");
        Ok(())
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store
            .borrow()
            .get(&composite)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
