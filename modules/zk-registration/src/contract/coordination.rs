//! Client surface the registration needs from a coordination service.
//!
//! Only session open, ephemeral create and session close are exposed.

use std::time::Duration;

/// Errors reported by a coordination client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinationError {
    #[error("cannot connect to '{addresses}': {reason}")]
    Connect { addresses: String, reason: String },

    #[error("node '{path}' already exists")]
    NodeExists { path: String },

    #[error("parent of node '{path}' does not exist")]
    NoParent { path: String },

    #[error("node '{path}' rejected: {reason}")]
    Rejected { path: String, reason: String },
}

/// Opens sessions against a coordination service.
pub trait CoordinationConnector: Send + Sync {
    /// Open a session to `addresses` (comma-separated `host:port` list).
    ///
    /// No watcher is installed. Blocks for at most about `timeout`.
    ///
    /// # Errors
    /// [`CoordinationError::Connect`] when no usable session is obtained.
    fn open(
        &self,
        addresses: &str,
        timeout: Duration,
    ) -> Result<Box<dyn CoordinationSession>, CoordinationError>;
}

/// A live session. Dropping the box without [`close`](Self::close) leaves
/// teardown to the client library.
pub trait CoordinationSession: Send {
    /// Synchronously create an ephemeral, non-sequential node with the open ACL.
    ///
    /// # Errors
    /// Any rejection by the service (collision, missing parent, ACL, size, connectivity).
    fn create_ephemeral(&self, path: &str, payload: &[u8]) -> Result<(), CoordinationError>;

    /// End the session. The service removes every ephemeral node it owns.
    fn close(self: Box<Self>);
}
