//! Storage change notifications.
//!
//! The invocation platform delivers batches shaped like object-storage
//! event records:
//!
//! ```json
//! {"Records": [{"s3": {"bucket": {"name": "fleet"}, "object": {"key": "hosts%2Fweb.txt"}}}]}
//! ```
//!
//! Object keys arrive URL-encoded and are decoded before use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A control file that changed and needs processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub container: String,
    pub key: String,
}

impl Notification {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

#[derive(Debug, Deserialize)]
struct EventBatch {
    #[serde(rename = "Records", default)]
    records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    s3: StorageEntity,
}

#[derive(Debug, Deserialize)]
struct StorageEntity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// Decode a URL-encoded object key (`+` is a space).
///
/// The key is decoded as a whole. Literal `&` and `=` are kept.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .into_owned()
}

/// Decode an event batch into notifications, in delivery order.
pub fn decode_event(payload: &str) -> Result<Vec<Notification>> {
    let batch: EventBatch =
        serde_json::from_str(payload).context("Failed to decode notification batch")?;

    Ok(batch
        .records
        .into_iter()
        .map(|r| Notification::new(r.s3.bucket.name, decode_object_key(&r.s3.object.key)))
        .collect())
}
