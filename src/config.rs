// Configuration loading and validation
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::events::DEFAULT_HISTORY_CAPACITY;
use crate::hooks::DEFAULT_HOOK_PRIORITY;

/// Default tolerance for webhook timestamp skew, in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Top-level configuration for a payhook context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayhookConfig {
    /// Capacity of the bounded event history. Zero disables retention.
    pub history_capacity: usize,
    /// Priority assigned to hook registrations that do not specify one.
    pub default_hook_priority: i32,
    pub webhook: WebhookConfig,
}

/// Webhook verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Signing secret shared with the payment provider.
    pub secret: Option<String>,
    /// Maximum accepted skew between the signature timestamp and now.
    pub tolerance_secs: u64,
}

impl Default for PayhookConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_hook_priority: DEFAULT_HOOK_PRIORITY,
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }
}

impl PayhookConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PayhookConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
                file_path: None,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
                suggestion: Some("create a payhook.yaml or use PayhookConfig::default()".to_string()),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        let config: PayhookConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
                file_path: Some(PathBuf::from(path)),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.webhook.tolerance_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "webhook.tolerance_secs".to_string(),
                value: "0".to_string(),
                message: "a zero tolerance rejects every webhook".to_string(),
                expected: "a positive number of seconds".to_string(),
            }
            .into());
        }

        if let Some(secret) = &self.webhook.secret {
            if secret.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "webhook.secret".to_string(),
                    value: String::new(),
                    message: "an empty secret cannot sign anything".to_string(),
                    expected: "a non-empty signing secret, or omit the field".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
