//! Configuration for the resource manager.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::host::{
    DrainerConfig, DEFAULT_DRAINER_PERIOD, DEFAULT_DRAINING_HOSTS_LIMIT, DEFAULT_RPC_TIMEOUT,
};

/// Resource manager configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host manager API URL.
    pub hostmgr_url: String,

    /// Drainer settings.
    pub drainer: DrainerConfig,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let hostmgr_url = lookup("RESMGR_HOSTMGR_URL")
            .unwrap_or_else(|| "http://127.0.0.1:5291".to_string());

        let period = match lookup("RESMGR_DRAINER_PERIOD_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("invalid RESMGR_DRAINER_PERIOD_SECS: {v}"))?,
            ),
            None => DEFAULT_DRAINER_PERIOD,
        };

        // Zero disables the per-call bound.
        let rpc_timeout = match lookup("RESMGR_RPC_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("invalid RESMGR_RPC_TIMEOUT_SECS: {v}"))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(DEFAULT_RPC_TIMEOUT),
        };

        let draining_hosts_limit = match lookup("RESMGR_DRAINING_HOSTS_LIMIT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid RESMGR_DRAINING_HOSTS_LIMIT: {v}"))?,
            None => DEFAULT_DRAINING_HOSTS_LIMIT,
        };

        let log_level = lookup("RESMGR_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            hostmgr_url,
            drainer: DrainerConfig {
                period,
                rpc_timeout,
                draining_hosts_limit,
            },
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.hostmgr_url, "http://127.0.0.1:5291");
        assert_eq!(config.drainer.period, Duration::from_secs(10));
        assert_eq!(config.drainer.rpc_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.drainer.draining_hosts_limit, 1000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_overrides() {
        let config = load(&[
            ("RESMGR_DRAINER_PERIOD_SECS", "30"),
            ("RESMGR_RPC_TIMEOUT_SECS", "0"),
            ("RESMGR_DRAINING_HOSTS_LIMIT", "50"),
        ])
        .unwrap();
        assert_eq!(config.drainer.period, Duration::from_secs(30));
        assert_eq!(config.drainer.rpc_timeout, None);
        assert_eq!(config.drainer.draining_hosts_limit, 50);
    }

    #[test]
    fn test_config_rejects_bad_period() {
        let err = load(&[("RESMGR_DRAINER_PERIOD_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("RESMGR_DRAINER_PERIOD_SECS"));
    }
}
