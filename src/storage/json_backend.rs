use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::{PortfelError, Result};

use super::{Collection, StorageBackend};

const COLLECTION_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed store keeping one pretty-printed JSON file per collection.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(PortfelError::Storage(format!(
                "invalid collection name `{collection}`"
            )));
        }
        Ok(self
            .root
            .join(format!("{collection}.{COLLECTION_EXTENSION}")))
    }
}

impl StorageBackend for JsonStorage {
    fn load_collection(&self, collection: &str) -> Result<Collection> {
        let path = self.collection_path(collection)?;
        if !path.exists() {
            return Ok(Collection::new());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|err| {
            PortfelError::Storage(format!("{} is not a valid collection: {err}", path.display()))
        })
    }

    fn save_collection(&self, collection: &str, documents: &Collection) -> Result<()> {
        let path = self.collection_path(collection)?;
        let json = serde_json::to_string_pretty(documents)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("JSON files in {}", self.root.display())
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_collection_loads_empty() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(storage.load_collection("wallets").unwrap().is_empty());
    }

    #[test]
    fn saves_without_leaving_temp_files() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().to_path_buf()).unwrap();
        let mut documents = Collection::new();
        documents.insert("abc".into(), json!({"currency": "USD", "amount": 1.0, "rate": 4.0}));
        storage.save_collection("wallets", &documents).unwrap();

        assert_eq!(storage.load_collection("wallets").unwrap(), documents);
        assert!(dir.path().join("wallets.json").exists());
        assert!(!dir.path().join("wallets.json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_collection_names() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(storage.collection_path("../etc").is_err());
        assert!(storage.collection_path("").is_err());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("expenses.json"), "{not json").unwrap();
        assert!(matches!(
            storage.load_collection("expenses"),
            Err(PortfelError::Storage(_))
        ));
    }
}
