use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::contracts::{Module, StatefulModule};

/// A registered module: its core plus the optional lifecycle hooks.
pub struct ModuleEntry {
    pub(crate) name: &'static str,
    pub(crate) core: Arc<dyn Module>,
    pub(crate) stateful: Option<Arc<dyn StatefulModule>>,
}

impl ModuleEntry {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_stateful(&self) -> bool {
        self.stateful.is_some()
    }
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("stateful", &self.stateful.is_some())
            .finish_non_exhaustive()
    }
}

/// Ordered set of modules. Order is registration order; stop runs in reverse.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }
}

/// Explicit module wiring done by the host binary.
#[derive(Default)]
pub struct RegistryBuilder {
    core: Vec<(&'static str, Arc<dyn Module>)>,
    stateful: Vec<(&'static str, Arc<dyn StatefulModule>)>,
}

impl RegistryBuilder {
    pub fn register_core_with_meta(&mut self, name: &'static str, module: Arc<dyn Module>) {
        self.core.push((name, module));
    }

    pub fn register_stateful_with_meta(
        &mut self,
        name: &'static str,
        module: Arc<dyn StatefulModule>,
    ) {
        self.stateful.push((name, module));
    }

    /// Register a module that has both a core and lifecycle hooks.
    pub fn register_stateful_module<T>(&mut self, name: &'static str, module: Arc<T>)
    where
        T: Module + StatefulModule,
    {
        self.register_core_with_meta(name, module.clone() as Arc<dyn Module>);
        self.register_stateful_with_meta(name, module as Arc<dyn StatefulModule>);
    }

    /// Validate the wiring and freeze it.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateModule` if a name is registered twice as core or as stateful
    /// - `RegistryError::CoreNotFound` if lifecycle hooks were registered without a core
    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.core {
            if !seen.insert(*name) {
                return Err(RegistryError::DuplicateModule(name));
            }
        }

        let mut seen_stateful = HashSet::new();
        for (name, _) in &self.stateful {
            if !seen.contains(name) {
                return Err(RegistryError::CoreNotFound(name));
            }
            if !seen_stateful.insert(*name) {
                return Err(RegistryError::DuplicateModule(name));
            }
        }

        let mut stateful = self.stateful;
        let modules = self
            .core
            .into_iter()
            .map(|(name, core)| {
                let hooks = stateful
                    .iter()
                    .position(|(n, _)| *n == name)
                    .map(|idx| stateful.swap_remove(idx).1);
                ModuleEntry {
                    name,
                    core,
                    stateful: hooks,
                }
            })
            .collect();

        Ok(ModuleRegistry { modules })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("module '{0}' registered more than once")]
    DuplicateModule(&'static str),
    #[error("core not found for '{0}'")]
    CoreNotFound(&'static str),
}
