//! ModKit runtime runner.
//!
//! Shutdown can be driven by OS signals, an external `CancellationToken`,
//! or an arbitrary future.

use crate::config::ConfigProvider;
use crate::registry::ModuleRegistry;
use crate::runtime::{HostRuntime, RunMode, shutdown};
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, we initiate shutdown.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

/// Options for running the ModKit runner.
pub struct RunOptions {
    /// Modules wired by the host binary.
    pub registry: ModuleRegistry,
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// Shutdown strategy.
    pub shutdown: ShutdownOptions,
    /// Serve, or only validate configuration.
    pub mode: RunMode,
}

/// Full cycle: init → start → wait → stop (or init only in [`RunMode::Check`]).
///
/// # Errors
/// Returns an error if a module fails to initialize or start.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    if opts.mode == RunMode::Serve {
        spawn_shutdown_waiter(opts.shutdown, cancel.clone());
    }

    let runtime = HostRuntime::new(opts.registry, opts.modules_cfg, cancel, opts.mode);
    runtime.run_module_phases().await
}

fn spawn_shutdown_waiter(shutdown: ShutdownOptions, cancel: CancellationToken) {
    match shutdown {
        ShutdownOptions::Signals => {
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(
                        error = %e,
                        "shutdown: primary waiter failed; falling back to ctrl_c()"
                    );
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "shutdown: ctrl_c() waiter failed");
                    }
                }
                cancel.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                cancel.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::info!("shutdown: external token will control lifecycle");
        }
    }
}
