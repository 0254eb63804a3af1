// Plugin bundles: cohesive sets of hook registrations and event
// subscriptions behind one load/unload toggle.

pub mod builtin;
pub mod manager;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::context::ExtensionContext;
use crate::error::{EventError, HookError, Result};
use crate::events::{Event, EventName, SubscriptionHandle};
use crate::hooks::{HookContext, HookHandle, HookPoint};

pub use builtin::{LoggingPlugin, MetricsPlugin, PaymentTotals};
pub use manager::{PluginManager, PluginState};

/// Identity of a plugin. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: Version,
    pub description: String,
    pub author: String,
}

impl PluginMetadata {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            description: description.into(),
            author: author.into(),
        }
    }
}

/// A loadable extension bundle.
///
/// `on_load` runs exactly once per load and performs its registrations
/// through the provided registrar, which records every handle so the
/// plugin manager can reverse them deterministically on unload.
/// `on_unload` is for plugin-owned state only; deregistration is the
/// manager's job.
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    fn on_load(&self, registrar: &mut PluginRegistrar<'_>) -> Result<()>;

    fn on_unload(&self) {}
}

/// Recording proxy over the shared managers.
///
/// Every registration made through the registrar lands in the per-plugin
/// ledger that backs deterministic unload.
pub struct PluginRegistrar<'a> {
    ctx: &'a ExtensionContext,
    hooks: Vec<HookHandle>,
    subscriptions: Vec<SubscriptionHandle>,
}

impl<'a> PluginRegistrar<'a> {
    pub(crate) fn new(ctx: &'a ExtensionContext) -> Self {
        Self {
            ctx,
            hooks: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Register a hook callback at the default priority.
    pub fn register_hook<F>(&mut self, point: HookPoint, callback: F) -> HookHandle
    where
        F: Fn(&HookContext) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        let handle = self.ctx.hooks().register(point, callback);
        self.hooks.push(handle);
        handle
    }

    /// Register a hook callback with an explicit priority.
    pub fn register_hook_with_priority<F>(
        &mut self,
        point: HookPoint,
        priority: i32,
        callback: F,
    ) -> HookHandle
    where
        F: Fn(&HookContext) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        let handle = self.ctx.hooks().register_with_priority(point, priority, callback);
        self.hooks.push(handle);
        handle
    }

    /// Subscribe to an event.
    pub fn subscribe<F>(&mut self, name: EventName, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Event) -> std::result::Result<(), EventError> + Send + Sync + 'static,
    {
        let handle = self.ctx.events().subscribe(name, callback);
        self.subscriptions.push(handle);
        handle
    }

    pub fn context(&self) -> &ExtensionContext {
        self.ctx
    }

    pub(crate) fn into_ledger(self) -> RegistrationLedger {
        RegistrationLedger {
            hooks: self.hooks,
            subscriptions: self.subscriptions,
        }
    }
}

/// Everything a plugin registered during `on_load`, kept so unload can
/// reverse it without relying on the plugin's cooperation.
#[derive(Debug, Default)]
pub(crate) struct RegistrationLedger {
    hooks: Vec<HookHandle>,
    subscriptions: Vec<SubscriptionHandle>,
}

impl RegistrationLedger {
    pub(crate) fn revoke(&mut self, ctx: &ExtensionContext) {
        for handle in self.hooks.drain(..) {
            ctx.hooks().unregister(&handle);
        }
        for handle in self.subscriptions.drain(..) {
            ctx.events().unsubscribe(&handle);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len() + self.subscriptions.len()
    }
}
