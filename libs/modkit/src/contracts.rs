use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Core module: config resolution and wiring. Runs once, before any `start`.
///
/// `init` must not perform external side effects: it also runs when the host
/// is only validating its configuration.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &crate::context::ModuleCtx) -> anyhow::Result<()>;
}

/// Module with process-lifetime state.
///
/// `start` runs once after every module finished `init`; `stop` runs once at
/// shutdown, in reverse registration order. Neither is re-entered concurrently.
#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
