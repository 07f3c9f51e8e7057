//! Registration Lifecycle Manager.
//!
//! ```text
//! Unconfigured ──start──▶ Connecting ──▶ Registered ──stop──▶ Closed
//!                              │                                ▲
//!                              └────────▶ Failed ──────stop─────┘
//! ```
//!
//! At most one session handle is ever live. A handle whose node could not be
//! created is closed on the spot and dropped, so `stop` never closes it again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::contract::coordination::{CoordinationConnector, CoordinationSession};
use crate::domain::error::RegistrationError;
use crate::domain::resolver::{ConfigField, RegistrationConfig};

/// Session connection timeout used unless configured otherwise.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Initial state; also final when configuration is incomplete.
    Unconfigured,
    Connecting,
    /// Ephemeral node exists and the session is held.
    Registered,
    /// Open or create failed. No session is held.
    Failed,
    Closed,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Connecting => "connecting",
            Self::Registered => "registered",
            Self::Failed => "failed",
            Self::Closed => "closed",
        })
    }
}

/// Owns the registration session for the life of the process.
pub struct RegistrationManager {
    config: RegistrationConfig,
    connector: Arc<dyn CoordinationConnector>,
    timeout: Duration,
    state: RegistrationState,
    session: Option<Box<dyn CoordinationSession>>,
}

impl RegistrationManager {
    #[must_use]
    pub fn new(config: RegistrationConfig, connector: Arc<dyn CoordinationConnector>) -> Self {
        Self {
            config,
            connector,
            timeout: DEFAULT_SESSION_TIMEOUT,
            state: RegistrationState::Unconfigured,
            session: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Open the session and create the ephemeral node. Runs once.
    ///
    /// Blocks for up to the session timeout while connecting.
    ///
    /// # Errors
    /// - [`RegistrationError::MissingConfiguration`]: nothing was attempted
    /// - [`RegistrationError::SessionOpenFailed`]: no session, nothing to close
    /// - [`RegistrationError::NodeCreateFailed`]: the session was already closed
    /// - [`RegistrationError::AlreadyStarted`]: an attempt was made before
    pub fn start(&mut self) -> Result<(), RegistrationError> {
        if self.state != RegistrationState::Unconfigured {
            return Err(RegistrationError::AlreadyStarted { state: self.state });
        }

        let (Some(address), Some(path), Some(payload)) = (
            self.config.address(),
            self.config.path(),
            self.config.payload(),
        ) else {
            let fields = self.config.missing_fields();
            let names: Vec<&str> = fields.iter().copied().map(ConfigField::as_str).collect();
            tracing::warn!(
                missing = %names.join(", "),
                "Registration skipped: configuration is incomplete"
            );
            return Err(RegistrationError::MissingConfiguration { fields });
        };

        self.state = RegistrationState::Connecting;
        tracing::info!(
            addresses = address,
            timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            "Opening coordination session"
        );

        let session = match self.connector.open(address, self.timeout) {
            Ok(session) => session,
            Err(source) => {
                self.state = RegistrationState::Failed;
                tracing::warn!(
                    addresses = address,
                    error = %source,
                    "Coordination session open failed; continuing without registration"
                );
                return Err(RegistrationError::SessionOpenFailed {
                    addresses: address.to_owned(),
                    source,
                });
            }
        };

        match session.create_ephemeral(path, payload) {
            Ok(()) => {
                self.session = Some(session);
                self.state = RegistrationState::Registered;
                tracing::info!(path, bytes = payload.len(), "Registered ephemeral node");
                Ok(())
            }
            Err(source) => {
                session.close();
                self.state = RegistrationState::Failed;
                tracing::warn!(
                    path,
                    error = %source,
                    "Ephemeral node create failed; session closed, continuing without registration"
                );
                Err(RegistrationError::NodeCreateFailed {
                    path: path.to_owned(),
                    source,
                })
            }
        }
    }

    /// Close the session, if one is held. Idempotent.
    ///
    /// The service removes the ephemeral node when the session ends; no
    /// explicit delete is issued.
    pub fn stop(&mut self) {
        match self.state {
            RegistrationState::Unconfigured | RegistrationState::Closed => {
                tracing::debug!(state = %self.state, "No registration session to close");
            }
            RegistrationState::Connecting
            | RegistrationState::Registered
            | RegistrationState::Failed => {
                if let Some(session) = self.session.take() {
                    tracing::info!(path = self.config.path(), "Closing coordination session");
                    session.close();
                }
                self.state = RegistrationState::Closed;
            }
        }
    }
}

impl Drop for RegistrationManager {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!("Closing coordination session on drop");
            session.close();
        }
    }
}

impl fmt::Debug for RegistrationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationManager")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .field("state", &self.state)
            .field("has_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::contract::coordination::CoordinationError;
    use crate::domain::resolver::{ConfigField, ConfigResolver};
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    /// Counts calls; `open` fails when `refuse` is set.
    #[derive(Default)]
    struct Counter {
        opens: Mutex<usize>,
        closes: Arc<Mutex<usize>>,
        refuse: bool,
    }

    struct CountedSession(Arc<Mutex<usize>>);

    impl CoordinationSession for CountedSession {
        fn create_ephemeral(&self, _path: &str, _payload: &[u8]) -> Result<(), CoordinationError> {
            Ok(())
        }
        fn close(self: Box<Self>) {
            *self.0.lock() += 1;
        }
    }

    impl CoordinationConnector for Counter {
        fn open(
            &self,
            addresses: &str,
            _timeout: Duration,
        ) -> Result<Box<dyn CoordinationSession>, CoordinationError> {
            *self.opens.lock() += 1;
            if self.refuse {
                return Err(CoordinationError::Connect {
                    addresses: addresses.to_owned(),
                    reason: "refused".to_owned(),
                });
            }
            Ok(Box::new(CountedSession(self.closes.clone())))
        }
    }

    fn config(address: &str, path: &str, payload: &str) -> RegistrationConfig {
        let mut resolver = ConfigResolver::new();
        resolver
            .set_address(address)
            .set_path(path)
            .set_payload(payload);
        resolver.finalize().unwrap()
    }

    #[test]
    #[traced_test]
    fn incomplete_config_stays_unconfigured_without_opening() {
        let counter = Arc::new(Counter::default());
        let mut manager =
            RegistrationManager::new(config("zk1:2181", "", "10.0.0.5:8080"), counter.clone());

        let err = manager.start().unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::MissingConfiguration { ref fields } if fields == &[ConfigField::Path]
        ));
        assert_eq!(manager.state(), RegistrationState::Unconfigured);
        assert_eq!(*counter.opens.lock(), 0);
        assert!(logs_contain("Registration skipped: configuration is incomplete"));
        assert!(logs_contain("missing=path"));
    }

    #[test]
    #[traced_test]
    fn skipped_start_warns_once_for_all_missing_fields() {
        let counter = Arc::new(Counter::default());
        let cfg = ConfigResolver::new().finalize().unwrap();
        let mut manager = RegistrationManager::new(cfg, counter);

        assert!(manager.start().is_err());

        assert!(logs_contain("missing=address, path, payload"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("Registration skipped"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one skip warning, found {n}")),
            }
        });
    }

    #[test]
    fn start_then_stop_closes_once() {
        let counter = Arc::new(Counter::default());
        let mut manager = RegistrationManager::new(config("a:1", "/n", "v"), counter.clone());

        manager.start().unwrap();
        assert_eq!(manager.state(), RegistrationState::Registered);
        assert!(manager.has_session());

        manager.stop();
        manager.stop();

        assert_eq!(manager.state(), RegistrationState::Closed);
        assert_eq!(*counter.closes.lock(), 1);
    }

    #[test]
    fn second_start_never_opens_another_session() {
        let counter = Arc::new(Counter::default());
        let mut manager = RegistrationManager::new(config("a:1", "/n", "v"), counter.clone());

        manager.start().unwrap();
        let err = manager.start().unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::AlreadyStarted {
                state: RegistrationState::Registered
            }
        ));
        assert_eq!(*counter.opens.lock(), 1);
    }

    #[test]
    fn failed_open_then_stop_is_closed_without_close_call() {
        let counter = Arc::new(Counter {
            refuse: true,
            ..Counter::default()
        });
        let mut manager = RegistrationManager::new(config("a:1", "/n", "v"), counter.clone());

        assert!(matches!(
            manager.start(),
            Err(RegistrationError::SessionOpenFailed { .. })
        ));
        assert_eq!(manager.state(), RegistrationState::Failed);

        manager.stop();

        assert_eq!(manager.state(), RegistrationState::Closed);
        assert_eq!(*counter.closes.lock(), 0);
    }

    #[test]
    fn dropping_a_registered_manager_closes_the_session() {
        let counter = Arc::new(Counter::default());
        let mut manager = RegistrationManager::new(config("a:1", "/n", "v"), counter.clone());
        manager.start().unwrap();

        drop(manager);

        assert_eq!(*counter.closes.lock(), 1);
    }
}
