//! Collection-oriented document store with snapshot subscriptions.
//!
//! Documents are kept as JSON objects keyed by an opaque id. The id is not
//! part of the stored body; it is injected back through [`Document::with_id`]
//! when a document is read.

pub mod json_backend;
pub mod memory;
pub mod subscription;

use std::collections::{BTreeMap, HashMap};
use std::sync::{mpsc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{PortfelError, Result};

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
pub use subscription::Subscription;

/// Stored bodies of one collection keyed by document id.
pub type Collection = BTreeMap<String, Value>;

/// A record type living in a named collection of the store.
pub trait Document: Serialize + DeserializeOwned + Clone {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn with_id(self, id: String) -> Self;
}

/// Abstraction over persistence backends storing whole collections.
pub trait StorageBackend: Send + Sync {
    /// Returns the collection, empty when it was never written.
    fn load_collection(&self, collection: &str) -> Result<Collection>;

    fn save_collection(&self, collection: &str, documents: &Collection) -> Result<()>;

    fn describe(&self) -> String {
        "storage backend".into()
    }
}

pub struct DocumentStore {
    backend: Box<dyn StorageBackend>,
    write_lock: Mutex<()>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Collection>>>>,
}

impl DocumentStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Stores a new document under a freshly generated id and returns it with that id.
    pub fn add<T: Document>(&self, document: T) -> Result<T> {
        let id = Uuid::new_v4().simple().to_string();
        let body = serde_json::to_value(&document)?;
        self.modify(T::COLLECTION, |documents| {
            documents.insert(id.clone(), body);
            Ok(())
        })?;
        tracing::info!(collection = T::COLLECTION, id = %id, "document added");
        Ok(document.with_id(id))
    }

    /// Replaces the body of an existing document.
    pub fn update<T: Document>(&self, document: &T) -> Result<()> {
        let id = document.id().to_string();
        let body = serde_json::to_value(document)?;
        self.modify(T::COLLECTION, |documents| match documents.get_mut(&id) {
            Some(slot) => {
                *slot = body;
                Ok(())
            }
            None => Err(not_found(T::COLLECTION, &id)),
        })?;
        tracing::info!(collection = T::COLLECTION, id = %id, "document updated");
        Ok(())
    }

    pub fn delete<T: Document>(&self, id: &str) -> Result<()> {
        self.modify(T::COLLECTION, |documents| {
            documents
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| not_found(T::COLLECTION, id))
        })?;
        tracing::info!(collection = T::COLLECTION, id = %id, "document deleted");
        Ok(())
    }

    pub fn get<T: Document>(&self, id: &str) -> Result<Option<T>> {
        let documents = self.backend.load_collection(T::COLLECTION)?;
        documents
            .get(id)
            .map(|body| decode(id, body.clone()))
            .transpose()
    }

    pub fn list<T: Document>(&self) -> Result<Vec<T>> {
        decode_all(self.backend.load_collection(T::COLLECTION)?)
    }

    /// Documents whose string field `field` equals `value`.
    pub fn query_eq<T: Document>(&self, field: &str, value: &str) -> Result<Vec<T>> {
        self.query(|body| string_field(body, field) == Some(value))
    }

    /// Documents whose string field lies in `[lower, upper]` under string ordering.
    pub fn query_range<T: Document>(&self, field: &str, lower: &str, upper: &str) -> Result<Vec<T>> {
        self.query(|body| match string_field(body, field) {
            Some(found) => lower <= found && found <= upper,
            None => false,
        })
    }

    /// Opens a subscription delivering the current collection and then one
    /// snapshot per change. Dropping it unsubscribes.
    pub fn subscribe<T: Document>(&self) -> Result<Subscription<T>> {
        let (sender, receiver) = mpsc::channel();
        // held until registration so no write slips between load and push
        let _guard = self.lock_writes()?;
        let current = self.backend.load_collection(T::COLLECTION)?;
        // the receiver is alive, so the first send cannot fail
        let _ = sender.send(current);
        self.lock_subscribers()?
            .entry(T::COLLECTION.to_string())
            .or_default()
            .push(sender);
        tracing::debug!(collection = T::COLLECTION, "subscription opened");
        Ok(Subscription::new(receiver))
    }

    fn query<T: Document>(&self, predicate: impl Fn(&Value) -> bool) -> Result<Vec<T>> {
        let documents = self.backend.load_collection(T::COLLECTION)?;
        let matching = documents
            .into_iter()
            .filter(|(_, body)| predicate(body))
            .collect();
        decode_all(matching)
    }

    fn modify(
        &self,
        collection: &str,
        change: impl FnOnce(&mut Collection) -> Result<()>,
    ) -> Result<()> {
        let _guard = self.lock_writes()?;
        let mut documents = self.backend.load_collection(collection)?;
        change(&mut documents)?;
        self.backend.save_collection(collection, &documents)?;
        self.notify(collection, &documents)
    }

    fn notify(&self, collection: &str, documents: &Collection) -> Result<()> {
        let mut subscribers = self.lock_subscribers()?;
        if let Some(senders) = subscribers.get_mut(collection) {
            senders.retain(|sender| sender.send(documents.clone()).is_ok());
            tracing::debug!(collection, live = senders.len(), "snapshot delivered");
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| PortfelError::Storage("store write lock poisoned".into()))
    }

    fn lock_subscribers(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, Vec<mpsc::Sender<Collection>>>>> {
        self.subscribers
            .lock()
            .map_err(|_| PortfelError::Storage("subscriber registry poisoned".into()))
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self, collection: &str) -> usize {
        self.subscribers
            .lock()
            .map(|map| map.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

fn not_found(collection: &str, id: &str) -> PortfelError {
    PortfelError::DocumentNotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn string_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

pub(crate) fn decode<T: Document>(id: &str, body: Value) -> Result<T> {
    let document: T = serde_json::from_value(body)?;
    Ok(document.with_id(id.to_string()))
}

pub(crate) fn decode_all<T: Document>(documents: Collection) -> Result<Vec<T>> {
    documents
        .into_iter()
        .map(|(id, body)| decode(&id, body))
        .collect()
}
