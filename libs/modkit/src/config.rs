//! Typed module configuration access.
//!
//! Every module owns one section of the host configuration:
//!
//! ```yaml
//! modules:
//!   <module_name>:
//!     config: { ... }
//! ```
//!
//! Loading is lenient: a module without a section (or without `config`) gets
//! `T::default()`, so optional modules never block host startup. A section
//! that is present but does not deserialize into `T` is an error.

use serde::de::DeserializeOwned;

/// Configuration error for typed config operations
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// Lenient configuration loader that falls back to defaults.
///
/// - module not present → `Ok(T::default())`
/// - module value is not an object → `Ok(T::default())`
/// - no `config` field → `Ok(T::default())`
/// - `config` present but invalid → `Err(ConfigError::InvalidConfig)`
///
/// # Errors
/// Returns `ConfigError::InvalidConfig` if the config section exists but cannot be deserialized.
pub fn module_config_or_default<T: DeserializeOwned + Default>(
    provider: &dyn ConfigProvider,
    module_name: &str,
) -> Result<T, ConfigError> {
    let Some(module_raw) = provider.get_module_config(module_name) else {
        return Ok(T::default());
    };

    let Some(obj) = module_raw.as_object() else {
        return Ok(T::default());
    };

    let Some(config_section) = obj.get("config") else {
        return Ok(T::default());
    };

    serde_json::from_value(config_section.clone()).map_err(|e| ConfigError::InvalidConfig {
        module: module_name.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Deserialize, Default)]
    #[serde(deny_unknown_fields)]
    struct ProbeConfig {
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        interval_ms: u64,
    }

    struct MapProvider(HashMap<String, serde_json::Value>);

    impl MapProvider {
        fn new() -> Self {
            let mut modules = HashMap::new();
            modules.insert(
                "probe".to_owned(),
                json!({ "config": { "endpoint": "zk1:2181", "interval_ms": 250 } }),
            );
            modules.insert("bare".to_owned(), json!({ "metadata": {} }));
            modules.insert("scalar".to_owned(), json!("not an object"));
            modules.insert(
                "broken".to_owned(),
                json!({ "config": { "interval_ms": "soon" } }),
            );
            modules.insert(
                "typo".to_owned(),
                json!({ "config": { "endpont": "zk1:2181" } }),
            );
            Self(modules)
        }
    }

    impl ConfigProvider for MapProvider {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    #[test]
    fn parses_present_section() {
        let cfg: ProbeConfig = module_config_or_default(&MapProvider::new(), "probe").unwrap();
        assert_eq!(cfg.endpoint.as_deref(), Some("zk1:2181"));
        assert_eq!(cfg.interval_ms, 250);
    }

    #[test]
    fn missing_module_yields_default() {
        let cfg: ProbeConfig = module_config_or_default(&MapProvider::new(), "absent").unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn missing_config_key_yields_default() {
        let cfg: ProbeConfig = module_config_or_default(&MapProvider::new(), "bare").unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn non_object_module_yields_default() {
        let cfg: ProbeConfig = module_config_or_default(&MapProvider::new(), "scalar").unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn wrong_type_is_rejected_with_module_name() {
        let err = module_config_or_default::<ProbeConfig>(&MapProvider::new(), "broken")
            .unwrap_err();
        let ConfigError::InvalidConfig { module, .. } = &err;
        assert_eq!(module, "broken");
        assert!(err.to_string().starts_with("invalid config for module 'broken'"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = module_config_or_default::<ProbeConfig>(&MapProvider::new(), "typo");
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }
}
