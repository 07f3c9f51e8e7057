//! Host Runtime - orchestrates the `ModKit` lifecycle
//!
//! Phase order:
//! - `init` (all modules, registration order): config resolution only
//! - `start` (stateful modules): skipped in [`RunMode::Check`]
//! - wait for cancellation
//! - `stop` (started modules, reverse order)
//!
//! Every module finishes `init` before the first `start` runs. If a `start`
//! fails, the modules that already started are stopped before the error is
//! returned.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigProvider;
use crate::context::ModuleContextBuilder;
use crate::registry::{ModuleEntry, ModuleRegistry, RegistryError};

/// What the host process was launched to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Full lifecycle.
    #[default]
    Serve,
    /// Validate configuration: run `init` only, never `start`/`stop`.
    Check,
}

/// `HostRuntime` owns the lifecycle orchestration for `ModKit`.
pub struct HostRuntime {
    registry: ModuleRegistry,
    ctx_builder: ModuleContextBuilder,
    cancel: CancellationToken,
    mode: RunMode,
    /// Indices into `registry.modules()` of modules whose `start` succeeded.
    started: Mutex<Vec<usize>>,
}

impl HostRuntime {
    /// Create a new `HostRuntime`. No lifecycle phase runs yet.
    #[must_use]
    pub fn new(
        registry: ModuleRegistry,
        modules_cfg: Arc<dyn ConfigProvider>,
        cancel: CancellationToken,
        mode: RunMode,
    ) -> Self {
        let ctx_builder = ModuleContextBuilder::new(modules_cfg, cancel.clone(), mode);
        Self {
            registry,
            ctx_builder,
            cancel,
            mode,
            started: Mutex::new(Vec::new()),
        }
    }

    /// INIT phase: resolve every module's configuration.
    ///
    /// # Errors
    /// Returns `RegistryError::Init` for the first module whose `init` fails.
    pub async fn run_init_phase(&self) -> Result<(), RegistryError> {
        tracing::info!(mode = ?self.mode, "Phase: init");

        for entry in self.registry.modules() {
            let ctx = self.ctx_builder.for_module(entry.name);
            entry
                .core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: entry.name,
                    source,
                })?;
            tracing::debug!(module = entry.name, "Initialized module");
        }

        Ok(())
    }

    /// START phase: start all stateful modules in registration order.
    ///
    /// # Errors
    /// Returns `RegistryError::Start` for the first module whose `start` fails,
    /// after stopping the modules that had already started.
    pub async fn run_start_phase(&self) -> Result<(), RegistryError> {
        tracing::info!("Phase: start");

        for (idx, e) in self.registry.modules().iter().enumerate() {
            let Some(s) = &e.stateful else {
                continue;
            };

            tracing::debug!(module = e.name, "Starting stateful module");
            if let Err(source) = s.start(self.cancel.clone()).await {
                tracing::error!(module = e.name, error = %source, "Module failed to start");
                self.run_stop_phase().await;
                return Err(RegistryError::Start {
                    module: e.name,
                    source,
                });
            }
            self.started.lock().push(idx);
            tracing::info!(module = e.name, "Started module");
        }

        Ok(())
    }

    /// Stop a single module, logging errors but continuing execution.
    async fn stop_one_module(entry: &ModuleEntry, cancel: CancellationToken) {
        if let Some(s) = &entry.stateful {
            if let Err(err) = s.stop(cancel).await {
                tracing::warn!(module = entry.name, error = %err, "Failed to stop module");
            } else {
                tracing::info!(module = entry.name, "Stopped module");
            }
        }
    }

    /// STOP phase: stop started modules in reverse start order.
    ///
    /// Errors are logged but do not fail the shutdown. Each module is stopped at most once.
    pub async fn run_stop_phase(&self) {
        let started = std::mem::take(&mut *self.started.lock());
        if started.is_empty() {
            return;
        }

        tracing::info!("Phase: stop");
        let modules = self.registry.modules();
        for idx in started.into_iter().rev() {
            Self::stop_one_module(&modules[idx], self.cancel.clone()).await;
        }
    }

    /// Run the lifecycle for the configured [`RunMode`].
    ///
    /// # Errors
    /// Returns an error if `init` or `start` fails.
    pub async fn run_module_phases(self) -> anyhow::Result<()> {
        self.run_init_phase().await?;

        if self.mode == RunMode::Check {
            tracing::info!("Configuration check complete; start phase skipped");
            return Ok(());
        }

        self.run_start_phase().await?;

        self.cancel.cancelled().await;

        self.run_stop_phase().await;
        Ok(())
    }
}
