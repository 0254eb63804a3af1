// Webhook signature verification and event dispatch
//
// Verification follows the provider's signing scheme: the signature
// header carries a unix timestamp `t` and one or more `v1` HMAC-SHA256
// signatures computed over `"{t}.{payload}"`. Dispatch is a table of
// handlers keyed by the provider's event type string, with built-in
// default routing into the domain event vocabulary.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use serde_json::{json, Value};
use sha2::Sha256;

use crate::config::WebhookConfig;
use crate::context::ExtensionContext;
use crate::error::{Result, WebhookError};
use crate::events::EventName;
use crate::hooks::{HookContext, HookPoint};

type HmacSha256 = Hmac<Sha256>;

/// A verified webhook envelope from the payment provider.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub data: Value,
}

impl WebhookEvent {
    /// Parse the provider's event envelope: `id`, `type`, `data.object`.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload {
                message: e.to_string(),
            })?;

        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| WebhookError::InvalidPayload {
                message: "missing event id".to_string(),
            })?
            .to_string();
        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| WebhookError::InvalidPayload {
                message: "missing event type".to_string(),
            })?
            .to_string();
        let data = value
            .get("data")
            .and_then(|d| d.get("object"))
            .cloned()
            .unwrap_or(Value::Null);

        Ok(Self {
            id,
            event_type,
            data,
        })
    }
}

/// Verifies webhook signatures before anything else looks at the payload.
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        let secret = config
            .secret
            .clone()
            .ok_or(WebhookError::MissingSecret)?;
        Ok(Self::new(secret, config.tolerance_secs))
    }

    /// Verify a signature header against the raw payload and parse the
    /// envelope. Rejects bad signatures and stale timestamps.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent> {
        self.verify_at(payload, signature_header, Utc::now())
    }

    /// As `verify`, with an explicit notion of now.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent> {
        let (timestamp, candidates) = parse_signature_header(signature_header)?;

        let mut signed_payload = timestamp.to_string().into_bytes();
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(payload);

        let verified = candidates.iter().any(|candidate| {
            hex::decode(candidate).is_ok_and(|signature| {
                let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                    .expect("HMAC accepts any key length");
                mac.update(&signed_payload);
                mac.verify_slice(&signature).is_ok()
            })
        });
        if !verified {
            return Err(WebhookError::BadSignature.into());
        }

        let skew = (now.timestamp() - timestamp).abs();
        if skew > self.tolerance_secs as i64 {
            return Err(WebhookError::StaleTimestamp {
                skew_secs: skew,
                tolerance_secs: self.tolerance_secs,
            }
            .into());
        }

        WebhookEvent::from_slice(payload)
    }

    /// Produce a valid signature header for `payload` at `timestamp`.
    /// Intended for tests and local development tooling.
    pub fn signature_header(&self, payload: &[u8], timestamp: DateTime<Utc>) -> String {
        let t = timestamp.timestamp();
        let mut signed_payload = t.to_string().into_bytes();
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(payload);

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(&signed_payload);
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={t},v1={signature}")
    }
}

fn parse_signature_header(header: &str) -> Result<(i64, Vec<String>)> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => candidates.push(value.to_string()),
            _ => {}
        }
    }

    match (timestamp, candidates.is_empty()) {
        (Some(t), false) => Ok((t, candidates)),
        _ => Err(WebhookError::MissingSignature.into()),
    }
}

type WebhookHandler = Arc<dyn Fn(&WebhookEvent, &ExtensionContext) -> Result<()> + Send + Sync>;

/// Routes verified webhook events through hooks, handlers, and domain
/// events.
///
/// Control flow per event: publish `webhook.received`, trigger
/// `before_webhook_process` (veto-capable), run the registered handler
/// for the event type (or the default routing), then trigger
/// `after_webhook_process` and publish `webhook.processed`. Any failure
/// triggers `webhook_process_failed` best-effort and publishes
/// `webhook.failed` before propagating.
pub struct WebhookProcessor {
    ctx: ExtensionContext,
    handlers: RwLock<HashMap<String, WebhookHandler>>,
}

impl WebhookProcessor {
    pub fn new(ctx: ExtensionContext) -> Self {
        Self {
            ctx,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler for a provider event type, replacing any
    /// previous handler for that type (default routing included).
    pub fn register_handler<F>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&WebhookEvent, &ExtensionContext) -> Result<()> + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        tracing::info!(event_type = %event_type, "Registered custom webhook handler");
        self.handlers.write().insert(event_type, Arc::new(handler));
    }

    pub fn process(&self, event: &WebhookEvent) -> Result<()> {
        self.ctx.events().publish(
            EventName::WebhookReceived,
            json!({"event_id": event.id, "event_type": event.event_type}),
        );

        let hook_ctx =
            HookContext::webhook(Some(event.id.clone()), Some(event.event_type.clone()));
        if let Err(e) = self.ctx.hooks().trigger(HookPoint::BeforeWebhookProcess, &hook_ctx) {
            self.report_failure(event, &e);
            return Err(e);
        }

        let handler = self.handlers.read().get(&event.event_type).cloned();
        let outcome = match handler {
            Some(handler) => handler(event, &self.ctx),
            None => self.route_default(event),
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = self.ctx.hooks().trigger(HookPoint::AfterWebhookProcess, &hook_ctx)
                {
                    self.report_failure(event, &e);
                    return Err(e);
                }
                self.ctx.events().publish(
                    EventName::WebhookProcessed,
                    json!({"event_id": event.id, "event_type": event.event_type}),
                );
                tracing::info!(event_id = %event.id, event_type = %event.event_type, "Processed webhook event");
                Ok(())
            }
            Err(e) => {
                self.report_failure(event, &e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, event: &WebhookEvent, error: &crate::error::PayhookError) {
        let hook_ctx =
            HookContext::webhook(Some(event.id.clone()), Some(event.event_type.clone()))
                .with_error(error.to_string());
        // best-effort: a failing failure-hook must not mask the original error
        if let Err(hook_err) = self.ctx.hooks().trigger(HookPoint::WebhookProcessFailed, &hook_ctx)
        {
            tracing::warn!(error = %hook_err, "webhook_process_failed hook itself failed");
        }
        self.ctx.events().publish(
            EventName::WebhookFailed,
            json!({
                "event_id": event.id,
                "event_type": event.event_type,
                "error": error.to_string(),
            }),
        );
    }

    /// Built-in routing from provider event types to domain events,
    /// mirroring what a billing host does with each type.
    fn route_default(&self, event: &WebhookEvent) -> Result<()> {
        match event.event_type.as_str() {
            "checkout.session.completed" | "customer.subscription.created" => {
                self.ctx
                    .events()
                    .publish(EventName::SubscriptionCreated, event.data.clone());
                Ok(())
            }
            "customer.subscription.updated" => {
                self.ctx
                    .events()
                    .publish(EventName::SubscriptionUpdated, event.data.clone());
                Ok(())
            }
            "customer.subscription.deleted" => {
                self.ctx
                    .events()
                    .publish(EventName::SubscriptionCancelled, event.data.clone());
                Ok(())
            }
            "invoice.payment_succeeded" => {
                let hook_ctx = HookContext::payment(
                    event.data.get("payment_intent").and_then(Value::as_str).map(String::from),
                    event.data.get("amount_paid").and_then(Value::as_i64),
                    event.data.get("currency").and_then(Value::as_str).map(String::from),
                );
                self.ctx.hooks().trigger(HookPoint::PaymentSucceeded, &hook_ctx)?;
                self.ctx.events().publish(
                    EventName::PaymentSucceeded,
                    json!({
                        "invoice_id": event.data.get("id"),
                        "amount": event.data.get("amount_paid"),
                        "currency": event.data.get("currency"),
                    }),
                );
                Ok(())
            }
            "invoice.payment_failed" => {
                let hook_ctx = HookContext::payment(
                    event.data.get("payment_intent").and_then(Value::as_str).map(String::from),
                    event.data.get("amount_due").and_then(Value::as_i64),
                    event.data.get("currency").and_then(Value::as_str).map(String::from),
                );
                self.ctx.hooks().trigger(HookPoint::PaymentFailed, &hook_ctx)?;
                self.ctx.events().publish(
                    EventName::PaymentFailed,
                    json!({
                        "invoice_id": event.data.get("id"),
                        "amount": event.data.get("amount_due"),
                        "currency": event.data.get("currency"),
                    }),
                );
                Ok(())
            }
            other => {
                tracing::info!(event_type = %other, "No default handler for webhook event type");
                Ok(())
            }
        }
    }
}
