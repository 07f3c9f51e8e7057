#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use zk_registration::{CoordinationConnector, CoordinationError, CoordinationSession};

/// One call observed on the coordination client seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open { addresses: String, timeout: Duration },
    Create { path: String, payload: Vec<u8> },
    Close,
}

/// Scripted connector that records every call in order.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_open: bool,
    fail_create: bool,
}

impl RecordingConnector {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn rejecting_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|c| matches!(c, Call::Open { .. }))
    }

    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, Call::Create { .. }))
    }

    pub fn closes(&self) -> usize {
        self.count(|c| matches!(c, Call::Close))
    }
}

impl CoordinationConnector for RecordingConnector {
    fn open(
        &self,
        addresses: &str,
        timeout: Duration,
    ) -> Result<Box<dyn CoordinationSession>, CoordinationError> {
        self.calls.lock().push(Call::Open {
            addresses: addresses.to_owned(),
            timeout,
        });
        if self.fail_open {
            return Err(CoordinationError::Connect {
                addresses: addresses.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        Ok(Box::new(RecordingSession {
            calls: self.calls.clone(),
            fail_create: self.fail_create,
        }))
    }
}

struct RecordingSession {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_create: bool,
}

impl CoordinationSession for RecordingSession {
    fn create_ephemeral(&self, path: &str, payload: &[u8]) -> Result<(), CoordinationError> {
        self.calls.lock().push(Call::Create {
            path: path.to_owned(),
            payload: payload.to_vec(),
        });
        if self.fail_create {
            return Err(CoordinationError::NodeExists {
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    fn close(self: Box<Self>) {
        self.calls.lock().push(Call::Close);
    }
}
