//! Host bootstrap: layered configuration, logging and the server entry point.
//!
//! - [`config`]: `AppConfig` loaded from YAML + `APP__*` environment
//! - [`logging`]: console and rotating-file `tracing` sinks
//! - [`paths`]: home directory resolution
//! - [`run`]: drives a [`crate::ModuleRegistry`] until shutdown

pub mod config;
pub mod logging;
pub mod paths;
pub mod run;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use logging::init_logging;
pub use run::run_server;
