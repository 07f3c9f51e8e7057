use std::collections::TryReserveError;

use crate::contract::coordination::CoordinationError;
use crate::domain::lifecycle::RegistrationState;
use crate::domain::resolver::ConfigField;

/// Configuration finalization errors. Always fatal to configuration load.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot allocate buffer for registration {field}")]
    Allocation {
        field: ConfigField,
        #[source]
        source: TryReserveError,
    },
}

/// Outcome of a registration attempt other than success.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("registration skipped, not configured: {}", join_fields(.fields))]
    MissingConfiguration { fields: Vec<ConfigField> },

    #[error("failed to open coordination session to '{addresses}'")]
    SessionOpenFailed {
        addresses: String,
        #[source]
        source: CoordinationError,
    },

    #[error("failed to create ephemeral node '{path}'")]
    NodeCreateFailed {
        path: String,
        #[source]
        source: CoordinationError,
    },

    #[error("registration already attempted (state: {state})")]
    AlreadyStarted { state: RegistrationState },
}

impl RegistrationError {
    /// True for failures of an attempted registration, as opposed to a skipped one.
    #[must_use]
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::SessionOpenFailed { .. } | Self::NodeCreateFailed { .. }
        )
    }
}

fn join_fields(fields: &[ConfigField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
