use crate::document::{parse_document, DocumentFormat};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Maximum size for a runtime config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Read a runtime config file into a JSON tree.
///
/// The format follows the file extension (YAML, TOML, otherwise JSON5).
/// Symlinks at the final path component are rejected.
pub fn read_config_file_snapshot(path: &Path) -> Result<serde_json::Value> {
    let metadata = std::fs::symlink_metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        bail!(
            "Config file '{}' is a symlink, refusing to follow",
            path.display()
        );
    }

    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let format = DocumentFormat::from_key(&path.to_string_lossy());
    parse_document(&content, format)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}
