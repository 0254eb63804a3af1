// Plugin registry and load/unload lifecycle
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::ExtensionContext;
use crate::error::{PluginError, Result};
use crate::plugins::{Plugin, PluginMetadata, PluginRegistrar, RegistrationLedger};

/// Two-state plugin lifecycle: `unloaded -> loaded -> unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unloaded,
    Loaded,
}

struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    state: PluginState,
    ledger: RegistrationLedger,
}

/// Registry of plugins keyed by name.
///
/// Loading an already-loaded plugin and unloading an already-unloaded
/// one are explicit errors, so double-registration can never silently
/// duplicate callbacks. Unload reverses every registration made during
/// `on_load` through the recorded ledger.
pub struct PluginManager {
    ctx: ExtensionContext,
    plugins: DashMap<String, PluginEntry>,
}

impl PluginManager {
    pub fn new(ctx: ExtensionContext) -> Self {
        Self {
            ctx,
            plugins: DashMap::new(),
        }
    }

    /// Add a plugin in the unloaded state. Duplicate names are rejected.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = plugin.metadata().name;
        if self.plugins.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered { name }.into());
        }

        self.plugins.insert(
            name,
            PluginEntry {
                plugin,
                state: PluginState::Unloaded,
                ledger: RegistrationLedger::default(),
            },
        );
        Ok(())
    }

    /// Remove a plugin entirely, unloading it first if needed.
    pub fn unregister(&self, name: &str) -> Result<()> {
        if self.is_loaded(name).unwrap_or(false) {
            self.unload(name)?;
        }
        if self.plugins.remove(name).is_none() {
            return Err(PluginError::NotFound {
                name: name.to_string(),
                available: self.list_plugins(),
            }
            .into());
        }
        Ok(())
    }

    /// Load one plugin: run `on_load` with a recording registrar and
    /// keep the resulting ledger. Loading a loaded plugin is an error.
    pub fn load(&self, name: &str) -> Result<()> {
        let mut entry = self.plugins.get_mut(name).ok_or_else(|| PluginError::NotFound {
            name: name.to_string(),
            available: self.list_plugins(),
        })?;

        if entry.state == PluginState::Loaded {
            return Err(PluginError::AlreadyLoaded {
                name: name.to_string(),
            }
            .into());
        }

        let mut registrar = PluginRegistrar::new(&self.ctx);
        if let Err(e) = entry.plugin.on_load(&mut registrar) {
            // A half-registered plugin must not leave callbacks behind
            let mut partial = registrar.into_ledger();
            partial.revoke(&self.ctx);
            return Err(PluginError::LoadFailed {
                name: name.to_string(),
                message: e.to_string(),
            }
            .into());
        }

        entry.ledger = registrar.into_ledger();
        entry.state = PluginState::Loaded;
        tracing::info!(plugin = name, registrations = entry.ledger.len(), "Plugin loaded");
        Ok(())
    }

    /// Unload one plugin: notify it, then revoke its ledger.
    pub fn unload(&self, name: &str) -> Result<()> {
        let mut entry = self.plugins.get_mut(name).ok_or_else(|| PluginError::NotFound {
            name: name.to_string(),
            available: self.list_plugins(),
        })?;

        if entry.state == PluginState::Unloaded {
            return Err(PluginError::NotLoaded {
                name: name.to_string(),
            }
            .into());
        }

        entry.plugin.on_unload();
        let mut ledger = std::mem::take(&mut entry.ledger);
        ledger.revoke(&self.ctx);
        entry.state = PluginState::Unloaded;
        tracing::info!(plugin = name, "Plugin unloaded");
        Ok(())
    }

    /// Load every registered plugin that is not yet loaded.
    /// Already-loaded plugins are skipped, not treated as errors.
    pub fn load_all(&self) -> Result<usize> {
        let pending: Vec<String> = self
            .plugins
            .iter()
            .filter(|entry| entry.state == PluginState::Unloaded)
            .map(|entry| entry.key().clone())
            .collect();

        let mut loaded = 0;
        for name in pending {
            self.load(&name)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Unload every loaded plugin.
    pub fn unload_all(&self) -> Result<usize> {
        let loaded: Vec<String> = self
            .plugins
            .iter()
            .filter(|entry| entry.state == PluginState::Loaded)
            .map(|entry| entry.key().clone())
            .collect();

        let mut unloaded = 0;
        for name in loaded {
            self.unload(&name)?;
            unloaded += 1;
        }
        Ok(unloaded)
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).map(|entry| Arc::clone(&entry.plugin))
    }

    pub fn get_metadata(&self, name: &str) -> Option<PluginMetadata> {
        self.plugins.get(name).map(|entry| entry.plugin.metadata())
    }

    pub fn list_plugins(&self) -> Vec<String> {
        self.plugins.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_loaded(&self, name: &str) -> Option<bool> {
        self.plugins
            .get(name)
            .map(|entry| entry.state == PluginState::Loaded)
    }

    pub fn context(&self) -> &ExtensionContext {
        &self.ctx
    }
}
