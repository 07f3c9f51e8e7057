#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! ModKit - host module framework
//!
//! Modules implement [`Module`] (and optionally [`StatefulModule`]), are wired
//! into a [`registry::ModuleRegistry`] explicitly by the host binary, and are
//! driven through their lifecycle by [`runtime::HostRuntime`]:
//! **init → start → wait → stop**.

pub mod config;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

#[cfg(feature = "bootstrap")]
pub mod bootstrap;

pub use config::{ConfigError, ConfigProvider, module_config_or_default};
pub use context::{ModuleContextBuilder, ModuleCtx};
pub use contracts::{Module, StatefulModule};
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};
pub use runtime::{HostRuntime, RunMode, ShutdownOptions};
