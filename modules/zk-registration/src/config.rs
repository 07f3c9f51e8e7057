use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::lifecycle::DEFAULT_SESSION_TIMEOUT;
use crate::domain::resolver::ConfigResolver;

/// Configuration for the ZooKeeper registration module
///
/// ```yaml
/// modules:
///   zk_registration:
///     config:
///       coordination_address: "zk1:2181,zk2:2181"
///       coordination_path: "/services/web-01"
///       coordination_value: "10.0.0.5:8080"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZkRegistrationConfig {
    /// Comma-separated `host:port` list of the ensemble.
    #[serde(default)]
    pub coordination_address: Option<String>,
    /// Absolute path of the ephemeral node.
    #[serde(default)]
    pub coordination_path: Option<String>,
    /// Payload stored in the node.
    #[serde(default)]
    pub coordination_value: Option<String>,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// What a failed registration attempt does to host startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and keep serving without registration.
    #[default]
    Warn,
    /// Fail the start phase, aborting the host.
    Abort,
}

fn default_session_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_SESSION_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ZkRegistrationConfig {
    fn default() -> Self {
        Self {
            coordination_address: None,
            coordination_path: None,
            coordination_value: None,
            session_timeout_ms: default_session_timeout_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ZkRegistrationConfig {
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Feed the directives that are present into a fresh resolver.
    #[must_use]
    pub fn resolver(&self) -> ConfigResolver {
        let mut resolver = ConfigResolver::new();
        if let Some(address) = &self.coordination_address {
            resolver.set_address(address.as_str());
        }
        if let Some(path) = &self.coordination_path {
            resolver.set_path(path.as_str());
        }
        if let Some(value) = &self.coordination_value {
            resolver.set_payload(value.as_bytes());
        }
        resolver
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: ZkRegistrationConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.session_timeout(), DEFAULT_SESSION_TIMEOUT);
        assert_eq!(cfg.session_timeout_ms, 10_000);
        assert_eq!(cfg.failure_policy, FailurePolicy::Warn);
        assert!(cfg.coordination_address.is_none());
    }

    #[test]
    fn directives_reach_the_resolver() {
        let cfg: ZkRegistrationConfig = serde_json::from_value(json!({
            "coordination_address": "zk1:2181,zk2:2181",
            "coordination_path": "/services/web-01",
            "coordination_value": "10.0.0.5:8080",
            "failure_policy": "abort",
            "session_timeout_ms": 2500
        }))
        .unwrap();

        let resolved = cfg.resolver().finalize().unwrap();

        assert_eq!(resolved.address(), Some("zk1:2181,zk2:2181"));
        assert_eq!(resolved.path(), Some("/services/web-01"));
        assert_eq!(resolved.payload(), Some(&b"10.0.0.5:8080"[..]));
        assert_eq!(cfg.failure_policy, FailurePolicy::Abort);
        assert_eq!(cfg.session_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn directive_takes_exactly_one_string() {
        let res: Result<ZkRegistrationConfig, _> = serde_json::from_value(json!({
            "coordination_path": ["/a", "/b"]
        }));
        assert!(res.is_err());
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let res: Result<ZkRegistrationConfig, _> = serde_json::from_value(json!({
            "coordination_acl": "world:anyone"
        }));
        assert!(res.is_err());
    }
}
