// Event delivery counters
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::events::{Event, EventName};

/// Counters accumulated across the lifetime of an event manager.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventMetrics {
    total_events: u64,
    events_by_name: HashMap<EventName, u64>,
    failed_subscribers: u64,
    last_event_time: Option<DateTime<Utc>>,
}

impl EventMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self, event: &Event) {
        self.total_events += 1;
        *self.events_by_name.entry(event.name()).or_insert(0) += 1;
        self.last_event_time = Some(event.timestamp());
    }

    pub fn record_subscriber_failure(&mut self) {
        self.failed_subscribers += 1;
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn events_of(&self, name: EventName) -> u64 {
        self.events_by_name.get(&name).copied().unwrap_or(0)
    }

    pub fn failed_subscribers(&self) -> u64 {
        self.failed_subscribers
    }

    pub fn last_event_time(&self) -> Option<DateTime<Utc>> {
        self.last_event_time
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_empty() {
        let metrics = EventMetrics::new();
        assert_eq!(metrics.total_events(), 0);
        assert_eq!(metrics.events_of(EventName::PaymentFailed), 0);
        assert_eq!(metrics.failed_subscribers(), 0);
        assert!(metrics.last_event_time().is_none());
    }

    #[test]
    fn test_record_event_updates_counters() {
        let mut metrics = EventMetrics::new();
        let event = Event::new(EventName::CustomerCreated, serde_json::json!({}));

        metrics.record_event(&event);
        metrics.record_event(&Event::new(EventName::CustomerCreated, serde_json::json!({})));
        metrics.record_event(&Event::new(EventName::WebhookFailed, serde_json::json!({})));

        assert_eq!(metrics.total_events(), 3);
        assert_eq!(metrics.events_of(EventName::CustomerCreated), 2);
        assert_eq!(metrics.events_of(EventName::WebhookFailed), 1);
        assert!(metrics.last_event_time().is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut metrics = EventMetrics::new();
        metrics.record_event(&Event::new(EventName::PlanUpgraded, serde_json::json!({})));
        metrics.record_subscriber_failure();

        metrics.reset();

        assert_eq!(metrics.total_events(), 0);
        assert_eq!(metrics.failed_subscribers(), 0);
    }
}
