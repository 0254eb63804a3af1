// Billing value types used in hook contexts and event payloads
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-side subscription status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
        }
    }
}

/// Snapshot of a user's subscription state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_name: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
}

impl SubscriptionInfo {
    /// Active or trialing counts as subscribed.
    pub fn is_subscribed(&self) -> bool {
        matches!(
            self.status,
            Some(SubscriptionStatus::Active) | Some(SubscriptionStatus::Trialing)
        )
    }

    pub fn is_on_trial(&self) -> bool {
        self.status == Some(SubscriptionStatus::Trialing)
            && self.trial_end.is_some_and(|end| Utc::now() < end)
    }

    pub fn has_plan(&self, plan_name: &str) -> bool {
        self.is_subscribed() && self.plan_name.as_deref() == Some(plan_name)
    }

    pub fn has_any_plan(&self, plan_names: &[&str]) -> bool {
        self.is_subscribed()
            && self
                .plan_name
                .as_deref()
                .is_some_and(|plan| plan_names.contains(&plan))
    }

    /// Subscribed and inside the current billing period.
    pub fn subscription_active(&self) -> bool {
        self.is_subscribed() && self.current_period_end.is_some_and(|end| Utc::now() < end)
    }

    /// Whole days until renewal; None without a period end.
    pub fn days_until_renewal(&self) -> Option<i64> {
        self.current_period_end
            .map(|end| (end - Utc::now()).num_days().max(0))
    }
}

/// Provider-side payment status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    Failed,
    Canceled,
    Refunded,
}

/// A single payment transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_intent_id: Option<String>,
    pub invoice_id: Option<String>,
    pub customer_id: Option<String>,
    /// Amount in the currency's minor unit (cents for usd).
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
