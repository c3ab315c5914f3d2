use super::RuntimeConfig;
use anyhow::Result;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a runtime configuration.
pub fn validate_config(config: &RuntimeConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    let required = [
        ("container", &config.container),
        ("baselineKeyLinux", &config.baseline_key_linux),
        ("baselineKeyWindows", &config.baseline_key_windows),
        ("outputKeyLinux", &config.output_key_linux),
        ("outputKeyWindows", &config.output_key_windows),
    ];
    for (path, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError {
                path: path.to_string(),
                message: "Value must not be empty".to_string(),
            });
        }
    }

    if !config.output_key_linux.is_empty() && config.output_key_linux == config.output_key_windows {
        errors.push(ConfigValidationError {
            path: "outputKeyWindows".to_string(),
            message: "Output keys must differ per OS family".to_string(),
        });
    }

    // Baselines and outputs share a container.
    for output in [&config.output_key_linux, &config.output_key_windows] {
        if output == &config.baseline_key_linux || output == &config.baseline_key_windows {
            errors.push(ConfigValidationError {
                path: "outputKey".to_string(),
                message: format!("Output key '{output}' would overwrite a baseline"),
            });
        }
    }

    if config.max_concurrency == 0 {
        errors.push(ConfigValidationError {
            path: "maxConcurrency".to_string(),
            message: "Concurrency must be greater than 0".to_string(),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &RuntimeConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
