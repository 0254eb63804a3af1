// Payhook - extensibility core for payment services
//
// Two cooperating registries: a hook manager (synchronous,
// priority-ordered callbacks that can veto an in-flight operation) and
// an event manager (publish/subscribe with isolated subscribers and a
// bounded history). Plugins bundle registrations against both behind a
// load/unload lifecycle, and the webhook module verifies and routes
// provider events through the same machinery.

pub mod billing;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod plugins;
pub mod webhook;

// Re-export main types for easier access
pub use billing::{PaymentRecord, PaymentStatus, SubscriptionInfo, SubscriptionStatus};
pub use config::{PayhookConfig, WebhookConfig, DEFAULT_WEBHOOK_TOLERANCE_SECS};
pub use context::ExtensionContext;
pub use error::{
    ConfigError, EventError, HookError, PayhookError, PluginError, Result, WebhookError,
};
pub use events::{
    Event, EventManager, EventMetrics, EventName, SubscriptionHandle, DEFAULT_HISTORY_CAPACITY,
};
pub use hooks::{
    HookContext, HookHandle, HookManager, HookPoint, HookRegistrationInfo, DEFAULT_HOOK_PRIORITY,
};
pub use logging::{ColorConfig, LogConfig, LogFormat};
pub use plugins::{
    LoggingPlugin, MetricsPlugin, PaymentTotals, Plugin, PluginManager, PluginMetadata,
    PluginRegistrar, PluginState,
};
pub use webhook::{WebhookEvent, WebhookProcessor, WebhookVerifier};
