//! Structured document formats.
//!
//! Baselines and the runtime config file may be authored as JSON/JSON5,
//! YAML or TOML; the format is picked from the object key extension.
//! Resolved configs are always emitted as pretty JSON.

use anyhow::Result;
use serde_json::Value;

/// Source format of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON5, a superset of plain JSON.
    Json5,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a key or path extension, defaulting to JSON5.
    pub fn from_key(key: &str) -> Self {
        let ext = key
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => DocumentFormat::Yaml,
            "toml" => DocumentFormat::Toml,
            _ => DocumentFormat::Json5,
        }
    }
}

/// Parse document text in the given format.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Value> {
    let value = match format {
        DocumentFormat::Json5 => json5::from_str::<Value>(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(content)?,
        DocumentFormat::Toml => toml::from_str::<Value>(content)?,
    };
    Ok(value)
}

/// Serialize a document the way the monitoring agent consumes it.
pub fn to_pretty_json(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// SHA-256 of serialized document content, hex encoded.
pub fn content_digest(content: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// JSON type name, for shape errors.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
