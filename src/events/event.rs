// Event vocabulary and the immutable event record
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::EventError;

/// The fixed set of domain event names, dotted-namespace convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "customer.created")]
    CustomerCreated,
    #[serde(rename = "customer.updated")]
    CustomerUpdated,
    #[serde(rename = "subscription.created")]
    SubscriptionCreated,
    #[serde(rename = "subscription.updated")]
    SubscriptionUpdated,
    #[serde(rename = "subscription.cancelled")]
    SubscriptionCancelled,
    #[serde(rename = "subscription.renewed")]
    SubscriptionRenewed,
    #[serde(rename = "subscription.expired")]
    SubscriptionExpired,
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "payment.refunded")]
    PaymentRefunded,
    #[serde(rename = "webhook.received")]
    WebhookReceived,
    #[serde(rename = "webhook.processed")]
    WebhookProcessed,
    #[serde(rename = "webhook.failed")]
    WebhookFailed,
    #[serde(rename = "plan.upgraded")]
    PlanUpgraded,
    #[serde(rename = "plan.downgraded")]
    PlanDowngraded,
    #[serde(rename = "error.stripe_api")]
    StripeApiError,
    #[serde(rename = "error.database")]
    DatabaseError,
}

impl EventName {
    /// All recognized event names, in declaration order.
    pub fn all() -> &'static [EventName] {
        &[
            EventName::CustomerCreated,
            EventName::CustomerUpdated,
            EventName::SubscriptionCreated,
            EventName::SubscriptionUpdated,
            EventName::SubscriptionCancelled,
            EventName::SubscriptionRenewed,
            EventName::SubscriptionExpired,
            EventName::PaymentSucceeded,
            EventName::PaymentFailed,
            EventName::PaymentRefunded,
            EventName::WebhookReceived,
            EventName::WebhookProcessed,
            EventName::WebhookFailed,
            EventName::PlanUpgraded,
            EventName::PlanDowngraded,
            EventName::StripeApiError,
            EventName::DatabaseError,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::CustomerCreated => "customer.created",
            EventName::CustomerUpdated => "customer.updated",
            EventName::SubscriptionCreated => "subscription.created",
            EventName::SubscriptionUpdated => "subscription.updated",
            EventName::SubscriptionCancelled => "subscription.cancelled",
            EventName::SubscriptionRenewed => "subscription.renewed",
            EventName::SubscriptionExpired => "subscription.expired",
            EventName::PaymentSucceeded => "payment.succeeded",
            EventName::PaymentFailed => "payment.failed",
            EventName::PaymentRefunded => "payment.refunded",
            EventName::WebhookReceived => "webhook.received",
            EventName::WebhookProcessed => "webhook.processed",
            EventName::WebhookFailed => "webhook.failed",
            EventName::PlanUpgraded => "plan.upgraded",
            EventName::PlanDowngraded => "plan.downgraded",
            EventName::StripeApiError => "error.stripe_api",
            EventName::DatabaseError => "error.database",
        }
    }

    /// Namespace component ahead of the first dot, e.g. `subscription`.
    pub fn namespace(&self) -> &'static str {
        let s = self.as_str();
        &s[..s.find('.').unwrap_or(s.len())]
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventName {
    type Err = EventError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventName::all()
            .iter()
            .find(|name| name.as_str() == s)
            .copied()
            .ok_or_else(|| EventError::UnknownName {
                name: s.to_string(),
                available: EventName::all().iter().map(|n| n.as_str().to_string()).collect(),
            })
    }
}

/// An immutable record of a domain occurrence.
///
/// Constructed at publish time; the timestamp never changes afterwards.
/// The only long-lived owner is the event manager's bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    name: EventName,
    data: Value,
    timestamp: DateTime<Utc>,
}

impl Event {
    pub(crate) fn new(name: EventName, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> EventName {
        self.name
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
