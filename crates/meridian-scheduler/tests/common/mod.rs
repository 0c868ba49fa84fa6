//! Common test utilities for cluster integration tests.

pub mod fixtures;

use meridian_scheduler::{
    api::AppState,
    config::{HealthConfig, PlacementConfig},
    ClusterRegistry, HealthMonitor,
};
use std::sync::Arc;
use std::time::Duration;

/// Complete test cluster with all components wired together.
pub struct TestCluster {
    pub registry: Arc<ClusterRegistry>,
    pub monitor: HealthMonitor,
    pub app_state: Arc<AppState>,
}

impl TestCluster {
    /// Creates a new test cluster with default configuration.
    pub fn new() -> Self {
        Self::with_config(HealthConfig::default(), PlacementConfig::default())
    }

    /// Creates a new test cluster with custom configuration.
    pub fn with_config(health: HealthConfig, placement: PlacementConfig) -> Self {
        let registry = Arc::new(ClusterRegistry::new());
        let monitor = HealthMonitor::new(health, registry.clone());
        let app_state = Arc::new(AppState {
            registry: registry.clone(),
            placement,
        });

        Self {
            registry,
            monitor,
            app_state,
        }
    }

    /// Creates a test cluster with a short heartbeat timeout so staleness
    /// can be simulated with small time offsets.
    pub fn with_fast_timeouts() -> Self {
        let health = HealthConfig {
            monitor_interval: Duration::from_millis(50),
            heartbeat_timeout: Duration::from_millis(200),
        };
        Self::with_config(health, PlacementConfig::default())
    }
}

impl Default for TestCluster {
    fn default() -> Self {
        Self::new()
    }
}
