//! [`CoordinationConnector`] backed by the `zookeeper` crate.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use zookeeper::{Acl, CreateMode, WatchedEvent, Watcher, ZkError, ZkState, ZooKeeper};

use crate::contract::coordination::{
    CoordinationConnector, CoordinationError, CoordinationSession,
};

/// Connects to a real ZooKeeper ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZkConnector;

/// Session watcher that only traces. Registration never reacts to events.
struct SilentWatcher;

impl Watcher for SilentWatcher {
    fn handle(&self, event: WatchedEvent) {
        tracing::trace!(
            state = ?event.keeper_state,
            kind = ?event.event_type,
            "Ignoring coordination event"
        );
    }
}

impl CoordinationConnector for ZkConnector {
    /// `ZooKeeper::connect` returns before any server has answered, so the
    /// session is only handed out once the client reports `Connected`.
    fn open(
        &self,
        addresses: &str,
        timeout: Duration,
    ) -> Result<Box<dyn CoordinationSession>, CoordinationError> {
        let connect_error = |reason: String| CoordinationError::Connect {
            addresses: addresses.to_owned(),
            reason,
        };

        let zk = ZooKeeper::connect(addresses, timeout, SilentWatcher)
            .map_err(|e| connect_error(e.to_string()))?;

        let (tx, rx) = mpsc::channel();
        let subscription = zk.add_listener(move |state| {
            // The receiver is gone once open has returned.
            tx.send(state).ok();
        });
        let established = wait_connected(&rx, timeout);
        zk.remove_listener(subscription);

        match established {
            Ok(()) => {
                tracing::debug!(addresses, "ZooKeeper session established");
                Ok(Box::new(ZkSession { zk }))
            }
            Err(reason) => {
                // Dropping the client sends its single CloseSession.
                drop(zk);
                Err(connect_error(reason))
            }
        }
    }
}

/// Block until the client reports a writable session, or give up.
fn wait_connected(states: &Receiver<ZkState>, timeout: Duration) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match states.recv_timeout(remaining) {
            Ok(ZkState::Connected) => return Ok(()),
            Ok(ZkState::AuthFailed) => return Err("authentication failed".to_owned()),
            Ok(ZkState::Closed) => {
                return Err("session closed before it was established".to_owned());
            }
            Ok(state) => {
                tracing::trace!(?state, "Waiting for ZooKeeper session");
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(format!(
                    "no session established within {} ms",
                    timeout.as_millis()
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err("client stopped while connecting".to_owned());
            }
        }
    }
}

struct ZkSession {
    zk: ZooKeeper,
}

impl CoordinationSession for ZkSession {
    fn create_ephemeral(&self, path: &str, payload: &[u8]) -> Result<(), CoordinationError> {
        let created = self
            .zk
            .create(
                path,
                payload.to_vec(),
                Acl::open_unsafe().clone(),
                CreateMode::Ephemeral,
            )
            .map_err(|e| map_create_error(path, e))?;
        tracing::debug!(path = %created, "ZooKeeper node created");
        Ok(())
    }

    /// `ZooKeeper` closes its session in `Drop`; calling `close()` as well
    /// would send a second `CloseSession` to a stopped client.
    fn close(self: Box<Self>) {
        tracing::debug!("Closing ZooKeeper session");
        drop(self);
    }
}

fn map_create_error(path: &str, err: ZkError) -> CoordinationError {
    match err {
        ZkError::NodeExists => CoordinationError::NodeExists {
            path: path.to_owned(),
        },
        ZkError::NoNode => CoordinationError::NoParent {
            path: path.to_owned(),
        },
        other => CoordinationError::Rejected {
            path: path.to_owned(),
            reason: other.to_string(),
        },
    }
}
