mod defaults;
mod io;
mod validation;

pub use defaults::*;
pub use io::*;
pub use validation::*;

use crate::control::OsFamily;
use crate::merge::MissingSectionPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Runtime configuration for the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Container holding baselines and resolved configs.
    pub container: String,
    pub baseline_key_linux: String,
    pub baseline_key_windows: String,
    /// Fixed output keys, one per OS family.
    pub output_key_linux: String,
    pub output_key_windows: String,
    /// Handling of PROCESS directives on baselines lacking
    /// `metrics.metrics_collected`.
    pub missing_metrics_policy: MissingSectionPolicy,
    /// Also write families no directive referenced.
    pub write_untouched: bool,
    pub max_concurrency: usize,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            baseline_key_linux: DEFAULT_BASELINE_KEY_LINUX.to_string(),
            baseline_key_windows: DEFAULT_BASELINE_KEY_WINDOWS.to_string(),
            output_key_linux: DEFAULT_OUTPUT_KEY_LINUX.to_string(),
            output_key_windows: DEFAULT_OUTPUT_KEY_WINDOWS.to_string(),
            missing_metrics_policy: MissingSectionPolicy::default(),
            write_untouched: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from file, environment, and defaults, then
    /// validate it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let value = read_config_file_snapshot(path)?;
                serde_json::from_value(value)
                    .with_context(|| format!("Invalid config file '{}'", path.display()))?
            }
            None => RuntimeConfig::default(),
        };

        config.apply_env_overrides();
        validate_config_object(&config)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let strings = [
            (ENV_CONTAINER, &mut self.container),
            (ENV_BASELINE_KEY_LINUX, &mut self.baseline_key_linux),
            (ENV_BASELINE_KEY_WINDOWS, &mut self.baseline_key_windows),
            (ENV_OUTPUT_KEY_LINUX, &mut self.output_key_linux),
            (ENV_OUTPUT_KEY_WINDOWS, &mut self.output_key_windows),
            (ENV_LOG_LEVEL, &mut self.log_level),
        ];
        for (name, field) in strings {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        if let Some(policy) = lookup(ENV_MISSING_METRICS) {
            match policy.parse() {
                Ok(policy) => self.missing_metrics_policy = policy,
                Err(e) => warn!("Ignoring {ENV_MISSING_METRICS}: {e}"),
            }
        }

        if let Some(flag) = lookup(ENV_WRITE_UNTOUCHED) {
            match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.write_untouched = true,
                "0" | "false" | "no" => self.write_untouched = false,
                other => warn!("Ignoring {ENV_WRITE_UNTOUCHED}: invalid flag '{other}'"),
            }
        }

        if let Some(limit) = lookup(ENV_MAX_CONCURRENCY) {
            match limit.parse() {
                Ok(limit) => self.max_concurrency = limit,
                Err(e) => warn!("Ignoring {ENV_MAX_CONCURRENCY}: {e}"),
            }
        }
    }

    /// Object key the baseline for `os` is read from.
    pub fn baseline_key(&self, os: OsFamily) -> &str {
        match os {
            OsFamily::Linux => &self.baseline_key_linux,
            OsFamily::Windows => &self.baseline_key_windows,
        }
    }

    /// Object key the resolved config for `os` is written to.
    pub fn output_key(&self, os: OsFamily) -> &str {
        match os {
            OsFamily::Linux => &self.output_key_linux,
            OsFamily::Windows => &self.output_key_windows,
        }
    }
}
