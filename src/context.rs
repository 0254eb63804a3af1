// Shared extension state handed to hosts and plugins
use std::sync::Arc;

use crate::config::PayhookConfig;
use crate::events::EventManager;
use crate::hooks::HookManager;

/// Process-wide extension state, made explicit instead of global.
///
/// The context owns the shared hook and event managers. Hosts receive a
/// clone at construction time; tests create a fresh context each to stay
/// isolated, and one process can run several independent contexts.
#[derive(Clone)]
pub struct ExtensionContext {
    hooks: Arc<HookManager>,
    events: Arc<EventManager>,
}

impl ExtensionContext {
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(HookManager::new()),
            events: Arc::new(EventManager::new()),
        }
    }

    pub fn with_config(config: &PayhookConfig) -> Self {
        Self {
            hooks: Arc::new(HookManager::with_default_priority(
                config.default_hook_priority,
            )),
            events: Arc::new(EventManager::with_capacity(config.history_capacity)),
        }
    }

    pub fn hooks(&self) -> &HookManager {
        &self.hooks
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }
}

impl Default for ExtensionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventName;
    use crate::hooks::HookPoint;

    #[test]
    fn test_clones_share_managers() {
        let ctx = ExtensionContext::new();
        let clone = ctx.clone();

        clone.hooks().register(HookPoint::PaymentSucceeded, |_| Ok(()));
        assert_eq!(ctx.hooks().callback_count(HookPoint::PaymentSucceeded), 1);

        clone.events().publish(EventName::PaymentSucceeded, serde_json::json!({}));
        assert_eq!(ctx.events().history_len(), 1);
    }

    #[test]
    fn test_separate_contexts_are_isolated() {
        let a = ExtensionContext::new();
        let b = ExtensionContext::new();

        a.hooks().register(HookPoint::PaymentFailed, |_| Ok(()));
        assert_eq!(b.hooks().callback_count(HookPoint::PaymentFailed), 0);
    }

    #[test]
    fn test_config_sets_history_capacity() {
        let config = PayhookConfig {
            history_capacity: 2,
            ..Default::default()
        };
        let ctx = ExtensionContext::with_config(&config);
        assert_eq!(ctx.events().history_capacity(), 2);
    }
}
