// Error handling framework for payhook
use std::path::PathBuf;
use thiserror::Error;

use crate::hooks::HookPoint;

pub type Result<T> = std::result::Result<T, PayhookError>;

/// Main error type for payhook with per-subsystem error hierarchy
#[derive(Debug, Error)]
pub enum PayhookError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("Hook dispatch failed: {0}")]
    Hook(#[from] Box<HookError>),

    #[error("Plugin operation failed: {0}")]
    Plugin(#[from] Box<PluginError>),

    #[error("Webhook processing failed: {0}")]
    Webhook(#[from] Box<WebhookError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors with file context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound {
        path: PathBuf,
        suggestion: Option<String>,
    },

    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        file_path: Option<PathBuf>,
    },

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
        expected: String,
    },

    #[error("Logging initialization failed: {message}")]
    LoggingInit { message: String },
}

/// Errors raised by hook callbacks and the hook manager
#[derive(Debug, Error)]
pub enum HookError {
    /// A `before_*` callback refused the in-flight operation.
    #[error("Operation vetoed by {point} hook: {reason}")]
    Vetoed { point: HookPoint, reason: String },

    /// A callback failed for a reason other than an explicit veto.
    #[error("Hook callback for {point} failed: {message}")]
    CallbackFailed { point: HookPoint, message: String },

    #[error("Unknown hook point: {name}")]
    UnknownPoint {
        name: String,
        available: Vec<String>,
    },
}

/// Errors raised by event name parsing and subscriber callbacks
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Unknown event name: {name}")]
    UnknownName {
        name: String,
        available: Vec<String>,
    },

    #[error("Subscriber callback failed: {message}")]
    Callback { message: String },
}

/// Plugin lifecycle errors
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin not found: {name}")]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Plugin already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Plugin already loaded: {name}")]
    AlreadyLoaded { name: String },

    #[error("Plugin not loaded: {name}")]
    NotLoaded { name: String },

    #[error("Plugin {name} failed to load: {message}")]
    LoadFailed { name: String, message: String },

    #[error("Invalid plugin version for {name}: {version}")]
    InvalidVersion { name: String, version: String },
}

/// Webhook verification and dispatch errors
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing or malformed signature header")]
    MissingSignature,

    #[error("Signature verification failed")]
    BadSignature,

    #[error("Webhook timestamp outside tolerance: skew of {skew_secs}s exceeds {tolerance_secs}s")]
    StaleTimestamp { skew_secs: i64, tolerance_secs: u64 },

    #[error("Invalid webhook payload: {message}")]
    InvalidPayload { message: String },

    #[error("No webhook secret configured")]
    MissingSecret,

    #[error("Handler for {event_type} failed: {message}")]
    HandlerFailed {
        event_type: String,
        message: String,
    },
}

impl From<ConfigError> for PayhookError {
    fn from(err: ConfigError) -> Self {
        PayhookError::Config(Box::new(err))
    }
}

impl From<HookError> for PayhookError {
    fn from(err: HookError) -> Self {
        PayhookError::Hook(Box::new(err))
    }
}

impl From<PluginError> for PayhookError {
    fn from(err: PluginError) -> Self {
        PayhookError::Plugin(Box::new(err))
    }
}

impl From<WebhookError> for PayhookError {
    fn from(err: WebhookError) -> Self {
        PayhookError::Webhook(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = PayhookError::from(HookError::Vetoed {
            point: HookPoint::BeforeSubscriptionCreate,
            reason: "price not allowed".to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("before_subscription_create"));
        assert!(message.contains("price not allowed"));
    }

    #[test]
    fn test_plugin_error_conversion() {
        let err: PayhookError = PluginError::AlreadyLoaded {
            name: "metrics".to_string(),
        }
        .into();
        assert!(matches!(err, PayhookError::Plugin(_)));
        assert!(err.to_string().contains("already loaded"));
    }

    #[test]
    fn test_webhook_stale_timestamp_display() {
        let err = WebhookError::StaleTimestamp {
            skew_secs: 301,
            tolerance_secs: 300,
        };
        assert!(err.to_string().contains("301"));
        assert!(err.to_string().contains("300"));
    }
}
