//! Meridian scheduler - node registry, pod placement, and health monitoring.
//!
//! The scheduler is responsible for:
//!
//! - **Node registration**: Tracking simulated nodes and their CPU capacity
//! - **Pod placement**: Choosing a node for each pod under a pluggable
//!   strategy (first-fit, best-fit, worst-fit)
//! - **Health monitoring**: Detecting node failure via missed heartbeats
//! - **Rescheduling**: Migrating a failed node's pods onto healthy capacity
//!
//! # Architecture
//!
//! All cluster state (nodes, pods, heartbeat timestamps) lives in a single
//! [`ClusterRegistry`] shared between the HTTP intake handlers and the
//! periodic [`HealthMonitor`] task. Placement reads a snapshot and never
//! mutates; reservations are single atomic registry operations, so the
//! node/pod cross-references stay consistent under concurrent intake and
//! monitor activity.

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod placement;
pub mod registry;

// Re-export main types
pub use config::{ApiConfig, HealthConfig, ManagerConfig, PlacementConfig};
pub use error::{ClusterError, Result};
pub use health::{HealthMonitor, TickReport};
pub use placement::{place_pod, BestFit, FirstFit, PlacementAlgorithm, StrategyKind, WorstFit};
pub use registry::{ClusterRegistry, NodeId, NodeInfo, NodeStatus, PodId, PodInfo};
