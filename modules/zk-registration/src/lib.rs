#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! ZooKeeper liveness registration.
//!
//! Binds the lifetime of the host process to one ephemeral node: the session
//! is opened and the node created when the host starts, and the session is
//! closed (so the service drops the node) when the host stops.
//!
//! - [`domain::resolver`] turns the three directives into a [`RegistrationConfig`]
//! - [`domain::lifecycle`] owns the session and its state machine
//! - [`contract::coordination`] is the client seam; [`infra::zookeeper`] implements it
//! - [`module::ZkRegistration`] plugs all of it into the host runtime

pub mod config;
pub mod contract;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::{FailurePolicy, ZkRegistrationConfig};
pub use contract::coordination::{CoordinationConnector, CoordinationError, CoordinationSession};
pub use domain::error::{RegistrationError, ResolveError};
pub use domain::lifecycle::{RegistrationManager, RegistrationState};
pub use domain::resolver::{ConfigField, ConfigResolver, RegistrationConfig};
pub use infra::zookeeper::ZkConnector;
pub use module::ZkRegistration;

/// Name under which the host registers this module and looks up its config section.
pub const MODULE_NAME: &str = "zk_registration";
