#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use once_cell::sync::Lazy;
use portfel_core::storage::{DocumentStore, JsonStorage};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Offline table with PLN as base: 1 USD = 4 PLN, 1 EUR = 5 PLN.
pub const OFFLINE_RATES: &str = r#"{
  "table": {
    "base": "PLN",
    "effective_date": "2024-06-03",
    "rates": {
      "USD": { "code": "USD", "currency": "dolar amerykański", "mid": 4.0 },
      "EUR": { "code": "EUR", "currency": "euro", "mid": 5.0 }
    }
  },
  "series": [
    { "code": "USD", "currency": "dolar amerykański", "points": [] }
  ]
}"#;

/// Creates a unique directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Writes the offline rate file into `home` and returns its path.
pub fn write_rates(home: &Path) -> PathBuf {
    let path = home.join("rates.json");
    fs::write(&path, OFFLINE_RATES).expect("write offline rates");
    path
}

/// Document store persisting JSON files under a fresh temporary directory.
pub fn json_store() -> (PathBuf, DocumentStore) {
    let root = temp_home().join("data");
    let storage = JsonStorage::new(root.clone()).expect("create json storage");
    (root, DocumentStore::new(Box::new(storage)))
}
