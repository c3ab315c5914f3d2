//! Baseline agent configs, one per OS family.
//!
//! Each baseline is fetched from the object store on first use and cached
//! for the rest of the process. Concurrent first requests for the same
//! family share one fetch; a failed fetch is not cached and the next
//! request tries again.

use crate::control::OsFamily;
use crate::document::{parse_document, DocumentFormat};
use crate::error::BaselineError;
use crate::storage::ObjectStore;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default agent configuration for one OS family.
///
/// The root is always an object. Contents are otherwise open-ended.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    os: OsFamily,
    document: Map<String, Value>,
}

impl BaselineConfig {
    /// Wrap a parsed document, rejecting non-object roots.
    pub fn new(os: OsFamily, document: Value) -> Result<Self, Value> {
        match document {
            Value::Object(document) => Ok(Self { os, document }),
            other => Err(other),
        }
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Deep copy of the document, for merging.
    pub fn to_document(&self) -> Map<String, Value> {
        self.document.clone()
    }
}

struct BaselineSlot {
    key: String,
    cell: OnceCell<Arc<BaselineConfig>>,
    fetches: AtomicUsize,
}

impl BaselineSlot {
    fn new(key: String) -> Self {
        Self {
            key,
            cell: OnceCell::new(),
            fetches: AtomicUsize::new(0),
        }
    }
}

/// Process-wide cache of baseline configs.
pub struct BaselineStore {
    store: Arc<dyn ObjectStore>,
    container: String,
    linux: BaselineSlot,
    windows: BaselineSlot,
}

impl BaselineStore {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: impl Into<String>,
        linux_key: impl Into<String>,
        windows_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            linux: BaselineSlot::new(linux_key.into()),
            windows: BaselineSlot::new(windows_key.into()),
        }
    }

    fn slot(&self, os: OsFamily) -> &BaselineSlot {
        match os {
            OsFamily::Linux => &self.linux,
            OsFamily::Windows => &self.windows,
        }
    }

    /// Cached baseline for `os`, fetching it on first use.
    pub async fn get(&self, os: OsFamily) -> Result<Arc<BaselineConfig>, BaselineError> {
        let slot = self.slot(os);
        slot.cell
            .get_or_try_init(|| self.fetch(os, slot))
            .await
            .map(Arc::clone)
    }

    /// Whether the baseline for `os` is already cached.
    pub fn is_loaded(&self, os: OsFamily) -> bool {
        self.slot(os).cell.initialized()
    }

    /// Number of underlying fetches issued for `os`, failed ones included.
    pub fn fetch_count(&self, os: OsFamily) -> usize {
        self.slot(os).fetches.load(Ordering::SeqCst)
    }

    async fn fetch(
        &self,
        os: OsFamily,
        slot: &BaselineSlot,
    ) -> Result<Arc<BaselineConfig>, BaselineError> {
        slot.fetches.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Fetching {} baseline from '{}/{}' via {}",
            os,
            self.container,
            slot.key,
            self.store.name()
        );

        let unavailable = |reason: String| {
            warn!("Baseline for {} unavailable: {}", os, reason);
            BaselineError::Unavailable {
                os,
                key: slot.key.clone(),
                reason,
            }
        };

        let content = self
            .store
            .read_object(&self.container, &slot.key)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if content.trim().is_empty() {
            return Err(unavailable("baseline document is empty".to_string()));
        }

        let value = parse_document(&content, DocumentFormat::from_key(&slot.key))
            .map_err(|e| unavailable(format!("cannot parse baseline document: {e}")))?;

        let baseline = BaselineConfig::new(os, value).map_err(|other| {
            unavailable(format!(
                "baseline root must be an object, found {}",
                crate::document::value_kind(&other)
            ))
        })?;

        info!(
            "Loaded {} baseline '{}' ({} top-level section(s))",
            os,
            slot.key,
            baseline.document().len()
        );
        Ok(Arc::new(baseline))
    }
}
