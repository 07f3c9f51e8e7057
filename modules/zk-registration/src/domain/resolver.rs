//! Configuration Resolver.
//!
//! Collects the three registration directives while configuration is parsed
//! and turns them into an immutable [`RegistrationConfig`]. No validation of
//! the values happens here: the coordination client is the authority on
//! address lists, paths and payload size.

use std::fmt;

use crate::domain::error::ResolveError;

/// One of the three registration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Address,
    Path,
    Payload,
}

impl ConfigField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Path => "path",
            Self::Payload => "payload",
        }
    }

    /// Configuration key that sets this field.
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::Address => "coordination_address",
            Self::Path => "coordination_path",
            Self::Payload => "coordination_value",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finalized registration settings. An unset field is `None`, never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationConfig {
    address: Option<String>,
    path: Option<String>,
    payload: Option<Vec<u8>>,
}

impl RegistrationConfig {
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Fields that are not configured, in directive order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ConfigField> {
        [
            (ConfigField::Address, self.address.is_none()),
            (ConfigField::Path, self.path.is_none()),
            (ConfigField::Payload, self.payload.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }
}

/// Accumulates raw directive values until [`finalize`](Self::finalize).
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    address: Option<String>,
    path: Option<String>,
    payload: Option<Vec<u8>>,
}

impl ConfigResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `coordination_address`: stored verbatim.
    pub fn set_address(&mut self, raw: impl Into<String>) -> &mut Self {
        self.address = Some(raw.into());
        self
    }

    /// `coordination_path`: stored verbatim, no leading-slash check.
    pub fn set_path(&mut self, raw: impl Into<String>) -> &mut Self {
        self.path = Some(raw.into());
        self
    }

    /// `coordination_value`: stored verbatim, no size limit.
    pub fn set_payload(&mut self, raw: impl Into<Vec<u8>>) -> &mut Self {
        self.payload = Some(raw.into());
        self
    }

    /// Copy every set value into an owned buffer.
    ///
    /// A field that was never set (or set to an empty value) stays `None` and
    /// a warning naming it is logged. Missing fields never fail finalization.
    ///
    /// # Errors
    /// [`ResolveError::Allocation`] if a buffer cannot be allocated.
    pub fn finalize(&self) -> Result<RegistrationConfig, ResolveError> {
        let address = copy_str(ConfigField::Address, self.address.as_deref())?;
        let path = copy_str(ConfigField::Path, self.path.as_deref())?;
        let payload = copy_bytes(ConfigField::Payload, self.payload.as_deref())?;

        Ok(RegistrationConfig {
            address,
            path,
            payload,
        })
    }
}

fn warn_missing(field: ConfigField) {
    tracing::warn!(
        field = field.as_str(),
        directive = field.directive(),
        "registration {field} is not set (`{}`); node will not be registered",
        field.directive()
    );
}

fn copy_str(field: ConfigField, raw: Option<&str>) -> Result<Option<String>, ResolveError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        warn_missing(field);
        return Ok(None);
    };
    let mut owned = String::new();
    owned
        .try_reserve_exact(raw.len())
        .map_err(|source| ResolveError::Allocation { field, source })?;
    owned.push_str(raw);
    Ok(Some(owned))
}

fn copy_bytes(field: ConfigField, raw: Option<&[u8]>) -> Result<Option<Vec<u8>>, ResolveError> {
    let Some(raw) = raw.filter(|b| !b.is_empty()) else {
        warn_missing(field);
        return Ok(None);
    };
    let mut owned = Vec::new();
    owned
        .try_reserve_exact(raw.len())
        .map_err(|source| ResolveError::Allocation { field, source })?;
    owned.extend_from_slice(raw);
    Ok(Some(owned))
}
