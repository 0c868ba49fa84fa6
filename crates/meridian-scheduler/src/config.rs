//! Configuration types for the cluster manager.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::placement::StrategyKind;

/// Cluster manager configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// HTTP API configuration.
    pub api: ApiConfig,
    /// Health monitor configuration.
    pub health: HealthConfig,
    /// Placement configuration.
    pub placement: PlacementConfig,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5000),
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Interval between monitor ticks.
    #[serde(with = "serde_duration_secs")]
    pub monitor_interval: Duration,
    /// Heartbeat staleness after which a node is considered failed.
    #[serde(with = "serde_duration_secs")]
    pub heartbeat_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(20),
        }
    }
}

/// Placement configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Strategy used when a placement request names none.
    pub default_strategy: StrategyKind,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_strategy: StrategyKind::FirstFit,
        }
    }
}

/// Serde helper for Duration as seconds.
mod serde_duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ManagerConfig::default();
        assert_eq!(config.api.listen_addr.port(), 5000);
        assert_eq!(config.health.monitor_interval, Duration::from_secs(5));
        assert_eq!(config.health.heartbeat_timeout, Duration::from_secs(20));
        assert_eq!(config.placement.default_strategy, StrategyKind::FirstFit);
    }

    #[test]
    fn durations_deserialize_from_seconds() {
        let config: HealthConfig =
            serde_json::from_str(r#"{"monitor_interval": 1, "heartbeat_timeout": 7}"#)
                .expect("deserialize");
        assert_eq!(config.monitor_interval, Duration::from_secs(1));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(7));
    }
}
