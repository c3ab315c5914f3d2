/// Default configuration constants used across the system.

/// Default container holding baselines and resolved configs.
pub const DEFAULT_CONTAINER: &str = "cwagent-config";

/// Default object key of the Linux baseline.
pub const DEFAULT_BASELINE_KEY_LINUX: &str = "defaults/linux.json";

/// Default object key of the Windows baseline.
pub const DEFAULT_BASELINE_KEY_WINDOWS: &str = "defaults/windows.json";

/// Default object key of the resolved Linux config.
pub const DEFAULT_OUTPUT_KEY_LINUX: &str = "linux-config.json";

/// Default object key of the resolved Windows config.
pub const DEFAULT_OUTPUT_KEY_WINDOWS: &str = "windows-config.json";

/// Default number of notifications processed concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default log level for this crate.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable names.
pub const ENV_CONTAINER: &str = "S3_BUCKET_NAME";
pub const ENV_BASELINE_KEY_LINUX: &str = "S3_OBJECT_KEY_DEFAULT_LINUX";
pub const ENV_BASELINE_KEY_WINDOWS: &str = "S3_OBJECT_KEY_DEFAULT_WINDOWS";
pub const ENV_OUTPUT_KEY_LINUX: &str = "CONFGEN_OUTPUT_KEY_LINUX";
pub const ENV_OUTPUT_KEY_WINDOWS: &str = "CONFGEN_OUTPUT_KEY_WINDOWS";
pub const ENV_MISSING_METRICS: &str = "CONFGEN_MISSING_METRICS";
pub const ENV_WRITE_UNTOUCHED: &str = "CONFGEN_WRITE_UNTOUCHED";
pub const ENV_MAX_CONCURRENCY: &str = "CONFGEN_MAX_CONCURRENCY";
pub const ENV_LOG_LEVEL: &str = "CONFGEN_LOG_LEVEL";
