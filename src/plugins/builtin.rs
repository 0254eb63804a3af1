// Built-in plugins: structured logging and payment running totals
use std::sync::Arc;

use parking_lot::Mutex;
use semver::Version;
use serde::Serialize;

use crate::error::Result;
use crate::events::EventName;
use crate::plugins::{Plugin, PluginMetadata, PluginRegistrar};

/// Logs every published event through `tracing`.
///
/// Failure-flavored events (`*.failed`, `error.*`) log at warn level,
/// everything else at info.
pub struct LoggingPlugin;

impl LoggingPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for LoggingPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new(
            "logging",
            Version::new(1, 0, 0),
            "Logs all published payment events",
            "Payhook Contributors",
        )
    }

    fn on_load(&self, registrar: &mut PluginRegistrar<'_>) -> Result<()> {
        for name in EventName::all() {
            let name = *name;
            registrar.subscribe(name, move |event| {
                let failure = name.namespace() == "error" || name.as_str().ends_with(".failed");
                if failure {
                    tracing::warn!(event = %name, data = %event.data(), "Payment event");
                } else {
                    tracing::info!(event = %name, data = %event.data(), "Payment event");
                }
                Ok(())
            });
        }
        Ok(())
    }
}

/// Running totals accumulated by the metrics plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaymentTotals {
    pub payments_succeeded: u64,
    pub payments_failed: u64,
    pub payments_refunded: u64,
    pub amount_collected: i64,
    pub subscriptions_created: u64,
    pub subscriptions_cancelled: u64,
}

/// Keeps running payment totals, mutated only by its own subscriptions.
///
/// External code can read a snapshot through `totals()` but has no way
/// to write the counters directly.
pub struct MetricsPlugin {
    totals: Arc<Mutex<PaymentTotals>>,
}

impl MetricsPlugin {
    pub fn new() -> Self {
        Self {
            totals: Arc::new(Mutex::new(PaymentTotals::default())),
        }
    }

    /// Snapshot of the current totals.
    pub fn totals(&self) -> PaymentTotals {
        *self.totals.lock()
    }
}

impl Default for MetricsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MetricsPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new(
            "metrics",
            Version::new(1, 0, 0),
            "Tracks running payment and subscription totals",
            "Payhook Contributors",
        )
    }

    fn on_load(&self, registrar: &mut PluginRegistrar<'_>) -> Result<()> {
        let totals = self.totals.clone();
        registrar.subscribe(EventName::PaymentSucceeded, move |event| {
            let mut totals = totals.lock();
            totals.payments_succeeded += 1;
            if let Some(amount) = event.data().get("amount").and_then(|v| v.as_i64()) {
                totals.amount_collected += amount;
            }
            Ok(())
        });

        let totals = self.totals.clone();
        registrar.subscribe(EventName::PaymentFailed, move |_event| {
            totals.lock().payments_failed += 1;
            Ok(())
        });

        let totals = self.totals.clone();
        registrar.subscribe(EventName::PaymentRefunded, move |event| {
            let mut totals = totals.lock();
            totals.payments_refunded += 1;
            if let Some(amount) = event.data().get("amount").and_then(|v| v.as_i64()) {
                totals.amount_collected -= amount;
            }
            Ok(())
        });

        let totals = self.totals.clone();
        registrar.subscribe(EventName::SubscriptionCreated, move |_event| {
            totals.lock().subscriptions_created += 1;
            Ok(())
        });

        let totals = self.totals.clone();
        registrar.subscribe(EventName::SubscriptionCancelled, move |_event| {
            totals.lock().subscriptions_cancelled += 1;
            Ok(())
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExtensionContext;
    use crate::plugins::PluginManager;
    use serde_json::json;

    #[test]
    fn test_metrics_plugin_accumulates_totals() {
        let ctx = ExtensionContext::new();
        let manager = PluginManager::new(ctx.clone());
        let plugin = Arc::new(MetricsPlugin::new());
        manager.register(plugin.clone()).unwrap();
        manager.load("metrics").unwrap();

        ctx.events().publish(EventName::PaymentSucceeded, json!({"amount": 1500}));
        ctx.events().publish(EventName::PaymentSucceeded, json!({"amount": 2500}));
        ctx.events().publish(EventName::PaymentFailed, json!({}));
        ctx.events().publish(EventName::PaymentRefunded, json!({"amount": 1500}));
        ctx.events().publish(EventName::SubscriptionCreated, json!({"user_id": 1}));

        let totals = plugin.totals();
        assert_eq!(totals.payments_succeeded, 2);
        assert_eq!(totals.payments_failed, 1);
        assert_eq!(totals.payments_refunded, 1);
        assert_eq!(totals.amount_collected, 2500);
        assert_eq!(totals.subscriptions_created, 1);
    }

    #[test]
    fn test_metrics_plugin_stops_counting_after_unload() {
        let ctx = ExtensionContext::new();
        let manager = PluginManager::new(ctx.clone());
        let plugin = Arc::new(MetricsPlugin::new());
        manager.register(plugin.clone()).unwrap();
        manager.load("metrics").unwrap();

        ctx.events().publish(EventName::PaymentSucceeded, json!({"amount": 100}));
        manager.unload("metrics").unwrap();
        ctx.events().publish(EventName::PaymentSucceeded, json!({"amount": 100}));

        assert_eq!(plugin.totals().payments_succeeded, 1);
    }

    #[test]
    fn test_logging_plugin_subscribes_to_all_events() {
        let ctx = ExtensionContext::new();
        let manager = PluginManager::new(ctx.clone());
        manager.register(Arc::new(LoggingPlugin::new())).unwrap();
        manager.load("logging").unwrap();

        for name in EventName::all() {
            assert_eq!(ctx.events().subscriber_count(*name), 1, "{name}");
        }

        manager.unload("logging").unwrap();
        for name in EventName::all() {
            assert_eq!(ctx.events().subscriber_count(*name), 0, "{name}");
        }
    }
}
