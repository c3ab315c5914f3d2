//! Local filesystem object store.
//!
//! Maps `(container, key)` to `<root>/<container>/<key>`. Keys may contain
//! `/` separators; `..` and absolute components are rejected.
//!
//! Each write lands in its own temp file beside the target and is renamed
//! into place, so concurrent writers to one key never share a temp path.

use super::ObjectStore;
use crate::error::StorageError;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Object store rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an object address to a path under the root.
    pub fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut path = self.root.clone();
        for part in [container, key] {
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(c) => path.push(c),
                    Component::CurDir => {}
                    _ => {
                        return Err(backend_error(
                            container,
                            key,
                            std::io::Error::new(
                                std::io::ErrorKind::InvalidInput,
                                "object address escapes the store root",
                            ),
                        ))
                    }
                }
            }
        }
        Ok(path)
    }
}

/// Write `body` to a fresh temp file in the target's directory, then
/// rename it over `path`.
fn persist_atomically(path: &Path, body: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(body.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn backend_error(container: &str, key: &str, source: std::io::Error) -> StorageError {
    StorageError::Backend {
        container: container.to_string(),
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn read_object(&self, container: &str, key: &str) -> Result<String, StorageError> {
        let path = self.object_path(container, key)?;
        debug!("Reading object from {}", path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(body) if body.is_empty() => Err(StorageError::ObjectEmpty {
                container: container.to_string(),
                key: key.to_string(),
            }),
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(backend_error(container, key, e)),
        }
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        body: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;
        let target = path.clone();
        let owned = body.to_string();

        tokio::task::spawn_blocking(move || persist_atomically(&target, &owned))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            .and_then(|written| written)
            .map_err(|e| backend_error(container, key, e))?;

        debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(())
    }
}
