//! Host runtime: lifecycle orchestration and shutdown handling.

mod host_runtime;
mod runner;
pub mod shutdown;

pub use host_runtime::{HostRuntime, RunMode};
pub use runner::{RunOptions, ShutdownOptions, run};
