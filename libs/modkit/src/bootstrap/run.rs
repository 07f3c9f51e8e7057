use super::AppConfig;
use crate::registry::ModuleRegistry;
use crate::runtime::{RunMode, RunOptions, ShutdownOptions, run};
use std::sync::Arc;

/// Drive `registry` with `config` as the module configuration source.
///
/// In [`RunMode::Serve`] this returns after Ctrl+C / SIGTERM and the stop phase.
/// In [`RunMode::Check`] it returns as soon as every module has initialized.
///
/// # Errors
///
/// Returns an error if a module fails to initialize or start.
pub async fn run_server(
    config: AppConfig,
    registry: ModuleRegistry,
    mode: RunMode,
) -> anyhow::Result<()> {
    tracing::info!(
        modules = registry.modules().len(),
        home_dir = %config.server.home_dir.display(),
        "Initializing modules..."
    );

    let run_options = RunOptions {
        registry,
        modules_cfg: Arc::new(config),
        shutdown: ShutdownOptions::Signals,
        mode,
    };

    run(run_options).await
}
