//! Baseline + directives → resolved agent config.
//!
//! The merger works on a deep copy of the cached baseline. Only the
//! sections a directive targets are touched; every other key passes
//! through verbatim:
//!
//! - `LOG` replaces `logs` wholesale. The last `LOG` directive wins.
//! - `PROCESS` sets `metrics.metrics_collected.processes` to a fixed
//!   process measurement block.

use crate::baseline::BaselineConfig;
use crate::control::{DirectiveKind, MonitoringDirective, OsFamily};
use crate::document::value_kind;
use crate::error::MergeError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Path of the section `PROCESS` directives write into.
const METRICS_COLLECTED_PATH: [&str; 2] = ["metrics", "metrics_collected"];

/// Process measurements injected by a `PROCESS` directive.
pub const PROCESS_MEASUREMENTS: [&str; 4] = ["cpu_usage", "memory_usage", "vsz", "rss"];

/// What to do with a `PROCESS` directive when the baseline has no
/// `metrics.metrics_collected` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSectionPolicy {
    /// Drop the override and log a warning.
    #[default]
    Skip,
    /// Create the missing `metrics` / `metrics_collected` objects.
    Create,
}

impl std::str::FromStr for MissingSectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingSectionPolicy::Skip),
            "create" => Ok(MissingSectionPolicy::Create),
            other => Err(format!("unknown missing-section policy '{other}'")),
        }
    }
}

/// Merged config for one OS family.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub os: OsFamily,
    /// Number of directives that changed the document.
    pub applied: usize,
    pub document: Value,
}

/// Fixed `processes` block.
pub fn process_metrics_block() -> Value {
    json!({
        "measurement": PROCESS_MEASUREMENTS,
        "resources": ["*"],
    })
}

/// Replacement `logs` section for a `LOG` directive.
///
/// Reserved record fields carry no log rules yet, so the section is an
/// empty collection definition.
fn logs_section(_directive: &MonitoringDirective) -> Value {
    Value::Object(Map::new())
}

/// OS families referenced by at least one directive, in canonical order.
pub fn referenced_families(directives: &[MonitoringDirective]) -> Vec<OsFamily> {
    OsFamily::ALL
        .into_iter()
        .filter(|os| directives.iter().any(|d| d.os == *os))
        .collect()
}

/// Applies directives to baselines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigMerger {
    policy: MissingSectionPolicy,
}

impl ConfigMerger {
    pub fn new(policy: MissingSectionPolicy) -> Self {
        Self { policy }
    }

    /// Merge the directives targeting `baseline.os()` into a copy of it.
    ///
    /// Directives for the other family are ignored. The baseline itself
    /// is never modified.
    pub fn merge(
        &self,
        baseline: &BaselineConfig,
        directives: &[MonitoringDirective],
    ) -> Result<ResolvedConfig, MergeError> {
        let os = baseline.os();
        let mut document = baseline.to_document();
        let mut applied = 0;

        for directive in directives.iter().filter(|d| d.os == os) {
            let changed = match directive.kind {
                DirectiveKind::Log => {
                    document.insert("logs".to_string(), logs_section(directive));
                    true
                }
                DirectiveKind::Process => self.apply_process(os, &mut document)?,
            };
            if changed {
                applied += 1;
            }
        }

        debug!("Resolved {} config: {} directive(s) applied", os, applied);
        Ok(ResolvedConfig {
            os,
            applied,
            document: Value::Object(document),
        })
    }

    fn apply_process(
        &self,
        os: OsFamily,
        document: &mut Map<String, Value>,
    ) -> Result<bool, MergeError> {
        let section = match self.policy {
            MissingSectionPolicy::Skip => object_at_mut(os, document, &METRICS_COLLECTED_PATH)?,
            MissingSectionPolicy::Create => {
                Some(object_at_or_insert(os, document, &METRICS_COLLECTED_PATH)?)
            }
        };

        match section {
            Some(collected) => {
                collected.insert("processes".to_string(), process_metrics_block());
                Ok(true)
            }
            None => {
                warn!(
                    "{} baseline has no '{}' section, PROCESS override dropped",
                    os,
                    METRICS_COLLECTED_PATH.join(".")
                );
                Ok(false)
            }
        }
    }
}

fn shape_error(os: OsFamily, path: &[&str], depth: usize, found: &Value) -> MergeError {
    MergeError::InvalidBaselineShape {
        os,
        path: path[..=depth].join("."),
        found: value_kind(found),
    }
}

/// Walk `path` through nested objects. `Ok(None)` when a segment is absent.
fn object_at_mut<'a>(
    os: OsFamily,
    root: &'a mut Map<String, Value>,
    path: &[&str],
) -> Result<Option<&'a mut Map<String, Value>>, MergeError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        match current.get_mut(*segment) {
            None => return Ok(None),
            Some(Value::Object(map)) => current = map,
            Some(other) => return Err(shape_error(os, path, depth, other)),
        }
    }
    Ok(Some(current))
}

/// Walk `path` through nested objects, creating absent segments.
fn object_at_or_insert<'a>(
    os: OsFamily,
    root: &'a mut Map<String, Value>,
    path: &[&str],
) -> Result<&'a mut Map<String, Value>, MergeError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(map) => current = map,
            other => return Err(shape_error(os, path, depth, other)),
        }
    }
    Ok(current)
}
