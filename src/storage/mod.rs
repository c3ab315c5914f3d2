//! Object storage seam.
//!
//! The generator reads control files and baselines from, and writes
//! resolved configs to, an object store addressed by container + key.

pub mod fs;
pub mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use crate::error::StorageError;
use async_trait::async_trait;

/// Read/write access to objects addressed by container and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Read an object as UTF-8 text.
    ///
    /// Fails with `ObjectNotFound` when the object does not exist and with
    /// `ObjectEmpty` when it exists but holds zero bytes.
    async fn read_object(&self, container: &str, key: &str) -> Result<String, StorageError>;

    /// Write an object, replacing any existing content.
    async fn write_object(&self, container: &str, key: &str, body: &str)
        -> Result<(), StorageError>;
}
