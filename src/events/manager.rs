// Subscription registry, publish dispatch, and bounded event history
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::error::EventError;
use crate::events::{Event, EventMetrics, EventName};

/// Default capacity of the in-memory event history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

type SubscriberCallback = Arc<dyn Fn(&Event) -> std::result::Result<(), EventError> + Send + Sync>;

struct Subscription {
    id: Uuid,
    callback: SubscriberCallback,
}

/// Capability returned by `subscribe`; pass back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: Uuid,
    name: EventName,
}

impl SubscriptionHandle {
    pub fn event_name(&self) -> EventName {
        self.name
    }
}

/// Decouples producers from consumers of domain occurrences.
///
/// Delivery is synchronous and completes before `publish` returns, but a
/// subscriber error never reaches the publisher: it is logged, counted,
/// and dispatch continues with the next subscriber in registration order.
pub struct EventManager {
    subscribers: RwLock<HashMap<EventName, Vec<Subscription>>>,
    history: Mutex<VecDeque<Event>>,
    capacity: usize,
    metrics: Mutex<EventMetrics>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a manager with an explicit history capacity.
    /// A capacity of zero disables history retention entirely.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            metrics: Mutex::new(EventMetrics::new()),
        }
    }

    /// Register a subscriber. Dispatch order is registration order.
    pub fn subscribe<F>(&self, name: EventName, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Event) -> std::result::Result<(), EventError> + Send + Sync + 'static,
    {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            callback: Arc::new(callback),
        };
        let handle = SubscriptionHandle {
            id: subscription.id,
            name,
        };

        self.subscribers
            .write()
            .entry(name)
            .or_default()
            .push(subscription);

        tracing::debug!(event = %name, "Registered event subscriber");
        handle
    }

    /// Remove a subscription. Returns false if the handle was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut subscribers = self.subscribers.write();
        if let Some(list) = subscribers.get_mut(&handle.name) {
            let before = list.len();
            list.retain(|s| s.id != handle.id);
            return list.len() < before;
        }
        false
    }

    /// Construct an event, retain it in history, and deliver it to every
    /// subscriber for `name`. Returns the constructed event.
    pub fn publish(&self, name: EventName, data: Value) -> Event {
        let event = Event::new(name, data);

        {
            let mut history = self.history.lock();
            if self.capacity > 0 {
                if history.len() == self.capacity {
                    history.pop_front();
                }
                history.push_back(event.clone());
            }
        }
        self.metrics.lock().record_event(&event);

        // Snapshot so subscribers can subscribe/unsubscribe reentrantly
        // without holding the registry lock during dispatch.
        let callbacks: Vec<SubscriberCallback> = {
            let subscribers = self.subscribers.read();
            subscribers
                .get(&name)
                .map(|list| list.iter().map(|s| Arc::clone(&s.callback)).collect())
                .unwrap_or_default()
        };

        tracing::trace!(event = %name, subscribers = callbacks.len(), "Publishing event");
        for callback in callbacks {
            // Each invocation is wrapped individually: one broken
            // subscriber must not block delivery to the rest.
            if let Err(e) = callback(&event) {
                tracing::warn!(event = %name, error = %e, "Event subscriber failed");
                self.metrics.lock().record_subscriber_failure();
            }
        }

        event
    }

    /// The most recent events, oldest-to-newest within the returned
    /// window. The filter applies before truncation, so the newest
    /// matching event is always included.
    pub fn history(&self, filter: Option<EventName>, limit: usize) -> Vec<Event> {
        let history = self.history.lock();
        let matching: Vec<&Event> = history
            .iter()
            .filter(|e| filter.map_or(true, |name| e.name() == name))
            .collect();

        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    pub fn history_capacity(&self) -> usize {
        self.capacity
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.subscribers
            .read()
            .get(&name)
            .map_or(0, |list| list.len())
    }

    /// Snapshot of delivery counters.
    pub fn metrics(&self) -> EventMetrics {
        self.metrics.lock().clone()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_returns_constructed_event() {
        let manager = EventManager::new();
        let event = manager.publish(EventName::CustomerCreated, json!({"customer_id": "cus_1"}));

        assert_eq!(event.name(), EventName::CustomerCreated);
        assert_eq!(event.data()["customer_id"], "cus_1");
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let manager = EventManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let log = log.clone();
            manager.subscribe(EventName::SubscriptionCreated, move |_event| {
                log.lock().push(label);
                Ok(())
            });
        }

        manager.publish(EventName::SubscriptionCreated, json!({}));
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_subscriber_failure_is_isolated() {
        let manager = EventManager::new();
        let reached = Arc::new(Mutex::new(false));
        let reached_ref = reached.clone();

        manager.subscribe(EventName::PaymentFailed, |_event| {
            Err(EventError::Callback {
                message: "broken integration".to_string(),
            })
        });
        manager.subscribe(EventName::PaymentFailed, move |_event| {
            *reached_ref.lock() = true;
            Ok(())
        });

        // publish returns normally despite the first subscriber failing
        manager.publish(EventName::PaymentFailed, json!({}));

        assert!(*reached.lock());
        assert_eq!(manager.metrics().failed_subscribers(), 1);
    }

    #[test]
    fn test_subscribers_observe_same_payload_and_timestamp() {
        let manager = EventManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            manager.subscribe(EventName::SubscriptionCreated, move |event| {
                seen.lock().push((event.data().clone(), event.timestamp()));
                Ok(())
            });
        }

        manager.publish(EventName::SubscriptionCreated, json!({"user_id": 1}));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, json!({"user_id": 1}));
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_history_eviction_is_fifo() {
        let manager = EventManager::with_capacity(3);

        let first = manager.publish(EventName::WebhookReceived, json!({"seq": 0}));
        for seq in 1..=3 {
            manager.publish(EventName::WebhookReceived, json!({"seq": seq}));
        }

        let history = manager.history(None, 10);
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|e| e.id() != first.id()));
        assert_eq!(history[0].data()["seq"], 1);
        assert_eq!(history[2].data()["seq"], 3);
    }

    #[test]
    fn test_history_filter_applies_before_truncation() {
        let manager = EventManager::new();

        manager.publish(EventName::CustomerCreated, json!({"seq": 0}));
        manager.publish(EventName::PaymentSucceeded, json!({"seq": 1}));
        manager.publish(EventName::CustomerCreated, json!({"seq": 2}));
        manager.publish(EventName::CustomerCreated, json!({"seq": 3}));

        let history = manager.history(Some(EventName::CustomerCreated), 2);
        assert_eq!(history.len(), 2);
        // chronological within the window, newest matching event included
        assert_eq!(history[0].data()["seq"], 2);
        assert_eq!(history[1].data()["seq"], 3);
    }

    #[test]
    fn test_history_limit_larger_than_contents() {
        let manager = EventManager::new();
        manager.publish(EventName::PlanUpgraded, json!({}));

        assert_eq!(manager.history(None, 50).len(), 1);
        assert_eq!(manager.history(Some(EventName::PlanDowngraded), 50).len(), 0);
    }

    #[test]
    fn test_zero_capacity_disables_history() {
        let manager = EventManager::with_capacity(0);
        manager.publish(EventName::DatabaseError, json!({}));

        assert_eq!(manager.history_len(), 0);
        // delivery and metrics still work without history
        assert_eq!(manager.metrics().total_events(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let manager = EventManager::new();
        let count = Arc::new(Mutex::new(0u32));
        let count_ref = count.clone();

        let handle = manager.subscribe(EventName::SubscriptionRenewed, move |_event| {
            *count_ref.lock() += 1;
            Ok(())
        });

        manager.publish(EventName::SubscriptionRenewed, json!({}));
        assert!(manager.unsubscribe(&handle));
        assert!(!manager.unsubscribe(&handle));
        manager.publish(EventName::SubscriptionRenewed, json!({}));

        assert_eq!(*count.lock(), 1);
        assert_eq!(manager.subscriber_count(EventName::SubscriptionRenewed), 0);
    }
}
