// Hook registration and synchronous dispatch
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{HookError, Result};
use crate::hooks::{HookContext, HookPoint};

/// Default priority for registrations that do not specify one.
/// Lower values run earlier.
pub const DEFAULT_HOOK_PRIORITY: i32 = 50;

type HookCallback = Arc<dyn Fn(&HookContext) -> std::result::Result<(), HookError> + Send + Sync>;

struct HookRegistration {
    id: Uuid,
    priority: i32,
    seq: u64,
    callback: HookCallback,
}

/// Capability returned by `register`; pass back to `unregister` to remove
/// the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookHandle {
    id: Uuid,
    point: HookPoint,
}

impl HookHandle {
    pub fn point(&self) -> HookPoint {
        self.point
    }
}

/// Introspection record for a single registration, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRegistrationInfo {
    pub id: Uuid,
    pub priority: i32,
}

/// Maintains per-point ordered callback chains and invokes them inline.
///
/// Callbacks for one point run in non-decreasing priority order; equal
/// priorities preserve registration order. The first callback error
/// aborts the remaining chain and propagates to the caller, which is how
/// a `before_*` hook vetoes an operation.
pub struct HookManager {
    registry: RwLock<HashMap<HookPoint, Vec<HookRegistration>>>,
    next_seq: AtomicU64,
    default_priority: i32,
}

impl HookManager {
    pub fn new() -> Self {
        Self::with_default_priority(DEFAULT_HOOK_PRIORITY)
    }

    /// Create a manager whose unprioritized registrations use `priority`.
    pub fn with_default_priority(priority: i32) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            default_priority: priority,
        }
    }

    /// Register a callback at the manager's default priority.
    pub fn register<F>(&self, point: HookPoint, callback: F) -> HookHandle
    where
        F: Fn(&HookContext) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.register_with_priority(point, self.default_priority, callback)
    }

    /// Register a callback with an explicit priority. Lower runs earlier.
    pub fn register_with_priority<F>(
        &self,
        point: HookPoint,
        priority: i32,
        callback: F,
    ) -> HookHandle
    where
        F: Fn(&HookContext) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        let registration = HookRegistration {
            id: Uuid::new_v4(),
            priority,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            callback: Arc::new(callback),
        };
        let handle = HookHandle {
            id: registration.id,
            point,
        };

        let mut registry = self.registry.write();
        let chain = registry.entry(point).or_default();
        chain.push(registration);
        // (priority, seq) keeps equal priorities in registration order
        chain.sort_by_key(|r| (r.priority, r.seq));

        tracing::debug!(point = %point, priority, "Registered hook callback");
        handle
    }

    /// Remove a registration. Returns false if the handle was already gone.
    pub fn unregister(&self, handle: &HookHandle) -> bool {
        let mut registry = self.registry.write();
        if let Some(chain) = registry.get_mut(&handle.point) {
            let before = chain.len();
            chain.retain(|r| r.id != handle.id);
            return chain.len() < before;
        }
        false
    }

    /// Invoke every callback registered for `point`, in priority order.
    ///
    /// Returns the first callback error and skips the rest of the chain.
    pub fn trigger(&self, point: HookPoint, context: &HookContext) -> Result<()> {
        // Snapshot the chain so callbacks can register/unregister without
        // holding the registry lock during dispatch.
        let chain: Vec<HookCallback> = {
            let registry = self.registry.read();
            match registry.get(&point) {
                Some(chain) => chain.iter().map(|r| Arc::clone(&r.callback)).collect(),
                None => return Ok(()),
            }
        };

        tracing::trace!(point = %point, callbacks = chain.len(), "Triggering hook");
        for callback in chain {
            callback(context)?;
        }
        Ok(())
    }

    /// Current registrations for `point`, in invocation order.
    pub fn get_registered(&self, point: HookPoint) -> Vec<HookRegistrationInfo> {
        self.registry
            .read()
            .get(&point)
            .map(|chain| {
                chain
                    .iter()
                    .map(|r| HookRegistrationInfo {
                        id: r.id,
                        priority: r.priority,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn callback_count(&self, point: HookPoint) -> usize {
        self.registry
            .read()
            .get(&point)
            .map_or(0, |chain| chain.len())
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_callback(
        log: Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl Fn(&HookContext) -> std::result::Result<(), HookError> {
        move |_ctx| {
            log.lock().push(label);
            Ok(())
        }
    }

    #[test]
    fn test_priority_ordering() {
        let manager = HookManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        manager.register_with_priority(
            HookPoint::BeforeCustomerCreate,
            90,
            recording_callback(log.clone(), "late"),
        );
        manager.register_with_priority(
            HookPoint::BeforeCustomerCreate,
            10,
            recording_callback(log.clone(), "early"),
        );
        manager.register_with_priority(
            HookPoint::BeforeCustomerCreate,
            50,
            recording_callback(log.clone(), "mid"),
        );

        manager
            .trigger(
                HookPoint::BeforeCustomerCreate,
                &HookContext::customer(None, None),
            )
            .unwrap();

        assert_eq!(*log.lock(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_equal_priority_preserves_registration_order() {
        let manager = HookManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            manager.register_with_priority(
                HookPoint::AfterCustomerCreate,
                DEFAULT_HOOK_PRIORITY,
                recording_callback(log.clone(), label),
            );
        }

        manager
            .trigger(
                HookPoint::AfterCustomerCreate,
                &HookContext::customer(Some("cus_1".to_string()), None),
            )
            .unwrap();

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_callback_aborts_chain() {
        let manager = HookManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        manager.register_with_priority(HookPoint::BeforeSubscriptionCreate, 1, |_ctx| {
            Err(HookError::Vetoed {
                point: HookPoint::BeforeSubscriptionCreate,
                reason: "blocked".to_string(),
            })
        });
        manager.register_with_priority(
            HookPoint::BeforeSubscriptionCreate,
            2,
            recording_callback(log.clone(), "never"),
        );

        let result = manager.trigger(
            HookPoint::BeforeSubscriptionCreate,
            &HookContext::subscription(None, None, None),
        );

        assert!(result.is_err());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unregister_removes_callback() {
        let manager = HookManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = manager.register(
            HookPoint::PaymentSucceeded,
            recording_callback(log.clone(), "gone"),
        );

        assert!(manager.unregister(&handle));
        assert!(!manager.unregister(&handle));

        manager
            .trigger(
                HookPoint::PaymentSucceeded,
                &HookContext::payment(None, None, None),
            )
            .unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_get_registered_reports_invocation_order() {
        let manager = HookManager::new();

        let late = manager.register_with_priority(HookPoint::StripeApiError, 80, |_| Ok(()));
        let early = manager.register_with_priority(HookPoint::StripeApiError, 20, |_| Ok(()));
        let _ = (late, early);

        let registered = manager.get_registered(HookPoint::StripeApiError);
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].priority, 20);
        assert_eq!(registered[1].priority, 80);
        assert_eq!(manager.callback_count(HookPoint::StripeApiError), 2);
    }

    #[test]
    fn test_trigger_without_registrations_is_noop() {
        let manager = HookManager::new();
        manager
            .trigger(
                HookPoint::AfterStripeApiCall,
                &HookContext::stripe_api("/v1/customers"),
            )
            .unwrap();
    }

    #[test]
    fn test_context_is_passed_to_callbacks() {
        let manager = HookManager::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_ref = seen.clone();

        manager.register(HookPoint::BeforeSubscriptionCreate, move |ctx| {
            *seen_ref.lock() = ctx.price_id().map(str::to_string);
            Ok(())
        });

        manager
            .trigger(
                HookPoint::BeforeSubscriptionCreate,
                &HookContext::subscription(None, None, Some("price_42".to_string())),
            )
            .unwrap();

        assert_eq!(seen.lock().as_deref(), Some("price_42"));
    }
}
