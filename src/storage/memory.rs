//! In-process object store.

use super::ObjectStore;
use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Object store backed by a map, with per-operation counters.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace an object without counting it as a write.
    pub fn insert(&self, container: &str, key: &str, body: impl Into<String>) {
        self.objects
            .write()
            .insert((container.to_string(), key.to_string()), body.into());
    }

    /// Current content of an object, if any.
    pub fn get(&self, container: &str, key: &str) -> Option<String> {
        self.objects
            .read()
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of `read_object` calls served so far, including failures.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `write_object` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_object(&self, container: &str, key: &str) -> Result<String, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.get(container, key) {
            Some(body) if body.is_empty() => Err(StorageError::ObjectEmpty {
                container: container.to_string(),
                key: key.to_string(),
            }),
            Some(body) => Ok(body),
            None => Err(StorageError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            }),
        }
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        body: &str,
    ) -> Result<(), StorageError> {
        self.insert(container, key, body);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
