//! Error types for the cluster manager.

use thiserror::Error;

/// Cluster manager errors.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Non-positive CPU amount in a registration or placement request.
    #[error("invalid cpu capacity: {0}")]
    InvalidCapacity(i64),

    /// Operation referenced a node that was never registered.
    #[error("node not found: {0}")]
    UnknownNode(String),

    /// Operation referenced an unknown pod.
    #[error("pod not found: {0}")]
    UnknownPod(String),

    /// No healthy node has enough free capacity for the request.
    #[error("no suitable node for {cpu_required} cpu")]
    NoSuitableNode {
        /// CPU the pod asked for.
        cpu_required: u32,
    },

    /// Unrecognised placement strategy name.
    #[error("unknown placement strategy: {0}")]
    UnknownStrategy(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cluster operations.
pub type Result<T> = std::result::Result<T, ClusterError>;
