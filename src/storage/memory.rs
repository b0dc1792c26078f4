use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{PortfelError, Result};

use super::{Collection, StorageBackend};

/// In-process backend; contents disappear with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load_collection(&self, collection: &str) -> Result<Collection> {
        let collections = self
            .collections
            .read()
            .map_err(|_| PortfelError::Storage("memory storage lock poisoned".into()))?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    fn save_collection(&self, collection: &str, documents: &Collection) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| PortfelError::Storage("memory storage lock poisoned".into()))?;
        collections.insert(collection.to_string(), documents.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory storage".into()
    }
}
