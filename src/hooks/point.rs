// Hook point vocabulary and structured trigger contexts
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HookError;

/// The fixed set of extension points triggered by a payment host.
///
/// `before_*` points run ahead of the operation and may veto it;
/// `after_*` points run once the operation succeeded; `*_failed` points
/// are triggered by the host when the operation itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    BeforeCustomerCreate,
    AfterCustomerCreate,
    CustomerCreateFailed,
    BeforeSubscriptionCreate,
    AfterSubscriptionCreate,
    SubscriptionCreateFailed,
    BeforeSubscriptionUpdate,
    AfterSubscriptionUpdate,
    BeforeSubscriptionCancel,
    AfterSubscriptionCancel,
    BeforeWebhookProcess,
    AfterWebhookProcess,
    WebhookProcessFailed,
    PaymentSucceeded,
    PaymentFailed,
    BeforeStripeApiCall,
    AfterStripeApiCall,
    StripeApiError,
}

impl HookPoint {
    /// All recognized hook points, in declaration order.
    pub fn all() -> &'static [HookPoint] {
        &[
            HookPoint::BeforeCustomerCreate,
            HookPoint::AfterCustomerCreate,
            HookPoint::CustomerCreateFailed,
            HookPoint::BeforeSubscriptionCreate,
            HookPoint::AfterSubscriptionCreate,
            HookPoint::SubscriptionCreateFailed,
            HookPoint::BeforeSubscriptionUpdate,
            HookPoint::AfterSubscriptionUpdate,
            HookPoint::BeforeSubscriptionCancel,
            HookPoint::AfterSubscriptionCancel,
            HookPoint::BeforeWebhookProcess,
            HookPoint::AfterWebhookProcess,
            HookPoint::WebhookProcessFailed,
            HookPoint::PaymentSucceeded,
            HookPoint::PaymentFailed,
            HookPoint::BeforeStripeApiCall,
            HookPoint::AfterStripeApiCall,
            HookPoint::StripeApiError,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeCustomerCreate => "before_customer_create",
            HookPoint::AfterCustomerCreate => "after_customer_create",
            HookPoint::CustomerCreateFailed => "customer_create_failed",
            HookPoint::BeforeSubscriptionCreate => "before_subscription_create",
            HookPoint::AfterSubscriptionCreate => "after_subscription_create",
            HookPoint::SubscriptionCreateFailed => "subscription_create_failed",
            HookPoint::BeforeSubscriptionUpdate => "before_subscription_update",
            HookPoint::AfterSubscriptionUpdate => "after_subscription_update",
            HookPoint::BeforeSubscriptionCancel => "before_subscription_cancel",
            HookPoint::AfterSubscriptionCancel => "after_subscription_cancel",
            HookPoint::BeforeWebhookProcess => "before_webhook_process",
            HookPoint::AfterWebhookProcess => "after_webhook_process",
            HookPoint::WebhookProcessFailed => "webhook_process_failed",
            HookPoint::PaymentSucceeded => "payment_succeeded",
            HookPoint::PaymentFailed => "payment_failed",
            HookPoint::BeforeStripeApiCall => "before_stripe_api_call",
            HookPoint::AfterStripeApiCall => "after_stripe_api_call",
            HookPoint::StripeApiError => "stripe_api_error",
        }
    }

    /// Whether this point runs ahead of its operation and may veto it.
    pub fn is_veto_point(&self) -> bool {
        self.as_str().starts_with("before_")
    }

    pub fn is_failure_point(&self) -> bool {
        matches!(
            self,
            HookPoint::CustomerCreateFailed
                | HookPoint::SubscriptionCreateFailed
                | HookPoint::WebhookProcessFailed
                | HookPoint::PaymentFailed
                | HookPoint::StripeApiError
        )
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HookPoint::all()
            .iter()
            .find(|point| point.as_str() == s)
            .copied()
            .ok_or_else(|| HookError::UnknownPoint {
                name: s.to_string(),
                available: HookPoint::all().iter().map(|p| p.as_str().to_string()).collect(),
            })
    }
}

/// Structured payload handed to hook callbacks.
///
/// Each variant carries the named arguments relevant to a family of hook
/// points; `extra` on the `Custom` variant is the escape hatch for
/// host-specific additions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HookContext {
    Customer {
        customer_id: Option<String>,
        email: Option<String>,
        error: Option<String>,
    },
    Subscription {
        subscription_id: Option<String>,
        customer_id: Option<String>,
        price_id: Option<String>,
        plan_name: Option<String>,
        error: Option<String>,
    },
    Webhook {
        event_id: Option<String>,
        event_type: Option<String>,
        error: Option<String>,
    },
    Payment {
        payment_intent_id: Option<String>,
        amount: Option<i64>,
        currency: Option<String>,
        error: Option<String>,
    },
    StripeApi {
        endpoint: String,
        method: Option<String>,
        error: Option<String>,
    },
    Custom(Map<String, Value>),
}

impl HookContext {
    /// Create a customer context
    pub fn customer(customer_id: Option<String>, email: Option<String>) -> Self {
        Self::Customer {
            customer_id,
            email,
            error: None,
        }
    }

    /// Create a subscription context
    pub fn subscription(
        subscription_id: Option<String>,
        customer_id: Option<String>,
        price_id: Option<String>,
    ) -> Self {
        Self::Subscription {
            subscription_id,
            customer_id,
            price_id,
            plan_name: None,
            error: None,
        }
    }

    /// Create a webhook context
    pub fn webhook(event_id: Option<String>, event_type: Option<String>) -> Self {
        Self::Webhook {
            event_id,
            event_type,
            error: None,
        }
    }

    /// Create a payment context
    pub fn payment(
        payment_intent_id: Option<String>,
        amount: Option<i64>,
        currency: Option<String>,
    ) -> Self {
        Self::Payment {
            payment_intent_id,
            amount,
            currency,
            error: None,
        }
    }

    /// Create a Stripe API call context
    pub fn stripe_api(endpoint: impl Into<String>) -> Self {
        Self::StripeApi {
            endpoint: endpoint.into(),
            method: None,
            error: None,
        }
    }

    /// Create a free-form context from arbitrary key/value pairs
    pub fn custom(fields: Map<String, Value>) -> Self {
        Self::Custom(fields)
    }

    /// Attach an error description, for `*_failed` points
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        match &mut self {
            HookContext::Customer { error, .. }
            | HookContext::Subscription { error, .. }
            | HookContext::Webhook { error, .. }
            | HookContext::Payment { error, .. }
            | HookContext::StripeApi { error, .. } => *error = Some(message),
            HookContext::Custom(fields) => {
                fields.insert("error".to_string(), Value::String(message));
            }
        }
        self
    }

    pub fn customer_id(&self) -> Option<&str> {
        match self {
            HookContext::Customer { customer_id, .. }
            | HookContext::Subscription { customer_id, .. } => customer_id.as_deref(),
            _ => None,
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            HookContext::Subscription {
                subscription_id, ..
            } => subscription_id.as_deref(),
            _ => None,
        }
    }

    pub fn price_id(&self) -> Option<&str> {
        match self {
            HookContext::Subscription { price_id, .. } => price_id.as_deref(),
            _ => None,
        }
    }

    pub fn event_type(&self) -> Option<&str> {
        match self {
            HookContext::Webhook { event_type, .. } => event_type.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HookContext::Customer { error, .. }
            | HookContext::Subscription { error, .. }
            | HookContext::Webhook { error, .. }
            | HookContext::Payment { error, .. }
            | HookContext::StripeApi { error, .. } => error.as_deref(),
            HookContext::Custom(fields) => fields.get("error").and_then(Value::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_hook_point_round_trip() {
        for point in HookPoint::all() {
            assert_eq!(HookPoint::from_str(point.as_str()).unwrap(), *point);
        }
    }

    #[test]
    fn test_hook_point_count_is_complete() {
        assert_eq!(HookPoint::all().len(), 18);
    }

    #[test]
    fn test_unknown_hook_point_is_rejected() {
        let err = HookPoint::from_str("before_refund_create").unwrap_err();
        match err {
            HookError::UnknownPoint { name, available } => {
                assert_eq!(name, "before_refund_create");
                assert_eq!(available.len(), 18);
            }
            other => panic!("Expected UnknownPoint, got {other:?}"),
        }
    }

    #[test]
    fn test_veto_point_classification() {
        assert!(HookPoint::BeforeSubscriptionCreate.is_veto_point());
        assert!(!HookPoint::AfterSubscriptionCreate.is_veto_point());
        assert!(HookPoint::PaymentFailed.is_failure_point());
        assert!(!HookPoint::PaymentSucceeded.is_failure_point());
    }

    #[test]
    fn test_hook_point_serde_uses_snake_case() {
        let json = serde_json::to_string(&HookPoint::BeforeWebhookProcess).unwrap();
        assert_eq!(json, "\"before_webhook_process\"");
        let back: HookPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HookPoint::BeforeWebhookProcess);
    }

    #[test]
    fn test_context_accessors() {
        let ctx = HookContext::subscription(
            Some("sub_123".to_string()),
            Some("cus_456".to_string()),
            Some("price_789".to_string()),
        );
        assert_eq!(ctx.subscription_id(), Some("sub_123"));
        assert_eq!(ctx.customer_id(), Some("cus_456"));
        assert_eq!(ctx.price_id(), Some("price_789"));
        assert_eq!(ctx.error(), None);
    }

    #[test]
    fn test_context_with_error() {
        let ctx = HookContext::webhook(Some("evt_1".to_string()), Some("invoice.paid".to_string()))
            .with_error("boom");
        assert_eq!(ctx.error(), Some("boom"));
    }

    #[test]
    fn test_custom_context_error_field() {
        let ctx = HookContext::custom(Map::new()).with_error("bad state");
        assert_eq!(ctx.error(), Some("bad state"));
    }
}
