use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, ConfigProvider, module_config_or_default};
use crate::runtime::RunMode;

/// Module execution context passed to [`crate::Module::init`].
///
/// Provides:
/// - **Configuration**: type-safe loading of the module's own section via `config()`
/// - **Run mode**: whether the host is serving or only checking its configuration
/// - **Lifecycle**: the root cancellation token
///
/// ```ignore
/// async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
///     let cfg: MyConfig = ctx.config()?;
///     self.state.store(Some(Arc::new(MyState::from(cfg))));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ModuleCtx {
    module_name: Arc<str>,
    config_provider: Arc<dyn ConfigProvider>,
    cancellation_token: CancellationToken,
    run_mode: RunMode,
}

impl ModuleCtx {
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Load this module's typed config, falling back to `T::default()` when absent.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` if the section exists but does not deserialize.
    pub fn config<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        module_config_or_default(self.config_provider.as_ref(), &self.module_name)
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    #[must_use]
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// True when the host only validates configuration and will not start modules.
    #[must_use]
    pub fn is_config_check(&self) -> bool {
        self.run_mode == RunMode::Check
    }
}

/// Factory for per-module contexts, created once by the runtime.
pub struct ModuleContextBuilder {
    config_provider: Arc<dyn ConfigProvider>,
    cancel: CancellationToken,
    run_mode: RunMode,
}

impl ModuleContextBuilder {
    #[must_use]
    pub fn new(
        config_provider: Arc<dyn ConfigProvider>,
        cancel: CancellationToken,
        run_mode: RunMode,
    ) -> Self {
        Self {
            config_provider,
            cancel,
            run_mode,
        }
    }

    #[must_use]
    pub fn for_module(&self, module_name: &str) -> ModuleCtx {
        ModuleCtx {
            module_name: Arc::from(module_name),
            config_provider: self.config_provider.clone(),
            cancellation_token: self.cancel.child_token(),
            run_mode: self.run_mode,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Cfg {
        #[serde(default)]
        name: String,
    }

    struct OneModule(serde_json::Value);

    impl ConfigProvider for OneModule {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            (module_name == "alpha").then_some(&self.0)
        }
    }

    fn builder(run_mode: RunMode, cancel: CancellationToken) -> ModuleContextBuilder {
        let provider: Arc<dyn ConfigProvider> =
            Arc::new(OneModule(json!({ "config": { "name": "a" } })));
        ModuleContextBuilder::new(provider, cancel, run_mode)
    }

    #[test]
    fn context_is_scoped_to_its_module() {
        let b = builder(RunMode::Serve, CancellationToken::new());

        let alpha = b.for_module("alpha");
        assert_eq!(alpha.module_name(), "alpha");
        assert_eq!(alpha.config::<Cfg>().unwrap().name, "a");

        let beta = b.for_module("beta");
        assert_eq!(beta.config::<Cfg>().unwrap().name, "");
    }

    #[test]
    fn run_mode_is_propagated() {
        let serve = builder(RunMode::Serve, CancellationToken::new()).for_module("alpha");
        assert!(!serve.is_config_check());

        let check = builder(RunMode::Check, CancellationToken::new()).for_module("alpha");
        assert!(check.is_config_check());
        assert_eq!(check.run_mode(), RunMode::Check);
    }

    #[test]
    fn root_cancellation_reaches_module_token() {
        let root = CancellationToken::new();
        let ctx = builder(RunMode::Serve, root.clone()).for_module("alpha");
        assert!(!ctx.cancellation_token().is_cancelled());
        root.cancel();
        assert!(ctx.cancellation_token().is_cancelled());
    }
}
