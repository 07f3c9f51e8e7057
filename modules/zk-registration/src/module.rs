use anyhow::{Context, Result, ensure};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use modkit::context::ModuleCtx;
use modkit::contracts::{Module, StatefulModule};

use crate::config::{FailurePolicy, ZkRegistrationConfig};
use crate::contract::coordination::CoordinationConnector;
use crate::domain::error::RegistrationError;
use crate::domain::lifecycle::{RegistrationManager, RegistrationState};
use crate::infra::zookeeper::ZkConnector;

/// State built by `init` and driven by `start`/`stop`.
struct Registration {
    manager: Mutex<RegistrationManager>,
    policy: FailurePolicy,
}

/// ZooKeeper Registration Module
///
/// Keeps an ephemeral node alive at `coordination_path` for as long as the
/// host runs. Does not take part in request handling.
pub struct ZkRegistration {
    connector: Arc<dyn CoordinationConnector>,
    registration: ArcSwapOption<Registration>,
}

impl Default for ZkRegistration {
    fn default() -> Self {
        Self::new(Arc::new(ZkConnector))
    }
}

impl ZkRegistration {
    #[must_use]
    pub fn new(connector: Arc<dyn CoordinationConnector>) -> Self {
        Self {
            connector,
            registration: ArcSwapOption::empty(),
        }
    }

    /// Current state, or `None` before `init`.
    #[must_use]
    pub fn state(&self) -> Option<RegistrationState> {
        self.registration
            .load()
            .as_ref()
            .map(|r| r.manager.lock().state())
    }

    fn apply_policy(policy: FailurePolicy, outcome: Result<(), RegistrationError>) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(RegistrationError::MissingConfiguration { .. }) => {
                tracing::info!("ZooKeeper registration disabled");
                Ok(())
            }
            Err(e) if e.is_attempt_failure() && policy == FailurePolicy::Abort => {
                Err(anyhow::Error::new(e).context("ZooKeeper registration failed"))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Serving without ZooKeeper registration");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Module for ZkRegistration {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: ZkRegistrationConfig = ctx.config()?;
        ensure!(
            cfg.session_timeout_ms > 0,
            "session_timeout_ms must be greater than zero"
        );

        let resolved = cfg
            .resolver()
            .finalize()
            .context("failed to finalize ZooKeeper registration config")?;
        let manager = RegistrationManager::new(resolved, self.connector.clone())
            .with_timeout(cfg.session_timeout());

        self.registration.store(Some(Arc::new(Registration {
            manager: Mutex::new(manager),
            policy: cfg.failure_policy,
        })));

        tracing::info!(
            policy = ?cfg.failure_policy,
            check_only = ctx.is_config_check(),
            "ZooKeeper registration module initialized"
        );
        Ok(())
    }
}

#[async_trait]
impl StatefulModule for ZkRegistration {
    async fn start(&self, _cancel: CancellationToken) -> Result<()> {
        let registration = self
            .registration
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("ZooKeeper registration not initialized"))?;
        let policy = registration.policy;

        // The client blocks while connecting.
        let outcome = tokio::task::spawn_blocking(move || registration.manager.lock().start())
            .await
            .context("registration task failed")?;

        Self::apply_policy(policy, outcome)
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let Some(registration) = self.registration.load_full() else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || registration.manager.lock().stop())
            .await
            .context("registration task failed")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::contract::coordination::CoordinationError;
    use crate::domain::resolver::ConfigField;

    fn open_failure() -> RegistrationError {
        RegistrationError::SessionOpenFailed {
            addresses: "zk1:2181".to_owned(),
            source: CoordinationError::Connect {
                addresses: "zk1:2181".to_owned(),
                reason: "timed out".to_owned(),
            },
        }
    }

    #[test]
    fn missing_configuration_never_aborts() {
        let skipped = RegistrationError::MissingConfiguration {
            fields: vec![ConfigField::Address],
        };
        assert!(ZkRegistration::apply_policy(FailurePolicy::Abort, Err(skipped)).is_ok());
    }

    #[test]
    fn attempt_failure_follows_policy() {
        assert!(ZkRegistration::apply_policy(FailurePolicy::Warn, Err(open_failure())).is_ok());

        let err = ZkRegistration::apply_policy(FailurePolicy::Abort, Err(open_failure()))
            .unwrap_err();
        assert_eq!(err.to_string(), "ZooKeeper registration failed");
        assert!(err.downcast_ref::<RegistrationError>().is_some());
    }

    #[test]
    fn state_is_none_before_init() {
        assert_eq!(ZkRegistration::default().state(), None);
    }
}
