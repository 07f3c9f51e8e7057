//! Modules linked into the server, in start order. Stop runs in reverse.

use anyhow::Result;
use modkit::{ModuleRegistry, RegistryBuilder};
use std::sync::Arc;

use zk_registration::ZkRegistration;

pub fn build_registry() -> Result<ModuleRegistry> {
    let mut builder = RegistryBuilder::default();
    builder.register_stateful_module(
        zk_registration::MODULE_NAME,
        Arc::new(ZkRegistration::default()),
    );
    Ok(builder.build()?)
}
