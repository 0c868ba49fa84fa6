//! Node and pod registry for the cluster.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::error::{ClusterError, Result};

/// Unique node identifier.
pub type NodeId = String;

/// Unique pod identifier.
pub type PodId = String;

/// Node health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Node is heartbeating and eligible for placements.
    Healthy,
    /// Node missed its heartbeat deadline.
    Failed,
}

impl NodeStatus {
    /// Returns true if the node can accept new pods.
    #[must_use]
    pub const fn is_schedulable(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Point-in-time snapshot of a node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Unique node identifier.
    pub id: NodeId,
    /// Fixed CPU capacity.
    pub total_cpu: u32,
    /// CPU not currently reserved by pods.
    pub available_cpu: u32,
    /// Current status.
    pub status: NodeStatus,
    /// Pods placed on this node, in assignment order.
    pub pods: Vec<PodId>,
    /// Time the node registered.
    pub registered_at: Instant,
    /// Time of the last heartbeat. Registration counts as the first one.
    pub last_heartbeat: Instant,
}

/// Point-in-time snapshot of a pod.
#[derive(Debug, Clone)]
pub struct PodInfo {
    /// Unique pod identifier.
    pub id: PodId,
    /// CPU reserved for this pod.
    pub cpu_required: u32,
    /// Node currently hosting the pod. Stale for orphaned pods.
    pub assigned_node: NodeId,
}

#[derive(Debug)]
struct NodeEntry {
    total_cpu: u32,
    available_cpu: u32,
    status: NodeStatus,
    pods: Vec<PodId>,
    registered_at: Instant,
    last_heartbeat: Instant,
}

#[derive(Debug)]
struct PodEntry {
    cpu_required: u32,
    assigned_node: NodeId,
}

#[derive(Debug)]
struct Inner {
    nodes: HashMap<NodeId, NodeEntry>,
    /// Registration order, for deterministic iteration.
    order: Vec<NodeId>,
    pods: HashMap<PodId, PodEntry>,
    next_pod: u64,
}

/// Cluster registry.
///
/// Nodes, pods, and heartbeat timestamps live behind one lock so every
/// mutator is a single atomic step and the node/pod cross-references stay
/// consistent: a pod listed on a node always points back at that node. The
/// one exception is an orphaned pod (evicted from a failed node with
/// nowhere to go), which keeps its stale node reference while appearing in
/// no node's list.
#[derive(Debug)]
pub struct ClusterRegistry {
    inner: RwLock<Inner>,
}

impl ClusterRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                nodes: HashMap::new(),
                order: Vec::new(),
                pods: HashMap::new(),
                next_pod: 0,
            }),
        }
    }

    /// Registers a new node with the given CPU capacity.
    ///
    /// The node starts healthy with all capacity available, and its
    /// registration time doubles as its first heartbeat.
    pub fn register(&self, total_cpu: u32) -> Result<NodeId> {
        if total_cpu == 0 {
            return Err(ClusterError::InvalidCapacity(0));
        }

        let node_id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut inner = self.inner.write();
        inner.nodes.insert(
            node_id.clone(),
            NodeEntry {
                total_cpu,
                available_cpu: total_cpu,
                status: NodeStatus::Healthy,
                pods: Vec::new(),
                registered_at: now,
                last_heartbeat: now,
            },
        );
        inner.order.push(node_id.clone());

        Ok(node_id)
    }

    /// Gets a node snapshot by id.
    pub fn node(&self, node_id: &str) -> Option<NodeInfo> {
        let inner = self.inner.read();
        inner.nodes.get(node_id).map(|entry| snapshot(node_id, entry))
    }

    /// Lists node snapshots in registration order.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id).map(|entry| snapshot(id, entry)))
            .collect()
    }

    /// Returns the number of registered nodes.
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Returns true if no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    /// Atomically reserves capacity on a node and records a new pod there.
    ///
    /// Succeeds only if the node exists, is healthy, and has at least
    /// `cpu_required` free. Returns `None` otherwise; callers treat that as
    /// a retryable scheduling miss (the capacity may have been claimed
    /// between their snapshot and this call).
    pub fn bind_new_pod(&self, node_id: &str, cpu_required: u32) -> Option<PodId> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let node = match inner.nodes.get_mut(node_id) {
            Some(node) if node.status.is_schedulable() && node.available_cpu >= cpu_required => {
                node
            }
            _ => return None,
        };

        let pod_id = format!("pod-{}", inner.next_pod);
        inner.next_pod += 1;

        node.available_cpu -= cpu_required;
        node.pods.push(pod_id.clone());
        inner.pods.insert(
            pod_id.clone(),
            PodEntry {
                cpu_required,
                assigned_node: node_id.to_owned(),
            },
        );

        Some(pod_id)
    }

    /// Atomically reserves capacity on a node and moves an evicted pod there.
    ///
    /// The pod must already have been evicted from its previous node;
    /// this only adds it to the new one. Returns `false` if the pod is
    /// unknown or the target cannot take it.
    pub fn rebind_pod(&self, pod_id: &str, new_node_id: &str) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let pod = match inner.pods.get_mut(pod_id) {
            Some(pod) => pod,
            None => return false,
        };
        let node = match inner.nodes.get_mut(new_node_id) {
            Some(node) if node.status.is_schedulable() && node.available_cpu >= pod.cpu_required => {
                node
            }
            _ => return false,
        };

        node.available_cpu -= pod.cpu_required;
        node.pods.push(pod_id.to_owned());
        pod.assigned_node = new_node_id.to_owned();

        true
    }

    /// Evicts every pod from a node and resets it to full capacity.
    ///
    /// Returns the evicted pod ids in assignment order. The evicted pods
    /// keep their stale node reference until rebound elsewhere.
    pub fn release_all(&self, node_id: &str) -> Vec<PodId> {
        let mut inner = self.inner.write();
        match inner.nodes.get_mut(node_id) {
            Some(node) => {
                node.available_cpu = node.total_cpu;
                std::mem::take(&mut node.pods)
            }
            None => Vec::new(),
        }
    }

    /// Sets a node's status.
    pub fn set_status(&self, node_id: &str, status: NodeStatus) -> Result<()> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| ClusterError::UnknownNode(node_id.to_owned()))?;
        node.status = status;
        Ok(())
    }

    /// Records a heartbeat for a node.
    pub fn touch(&self, node_id: &str) -> Result<()> {
        self.touch_at(node_id, Instant::now())
    }

    /// Records a heartbeat observed at the given time.
    pub fn touch_at(&self, node_id: &str, now: Instant) -> Result<()> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| ClusterError::UnknownNode(node_id.to_owned()))?;
        node.last_heartbeat = now;
        Ok(())
    }

    /// Returns the last heartbeat time for a node.
    pub fn last_seen(&self, node_id: &str) -> Option<Instant> {
        let inner = self.inner.read();
        inner.nodes.get(node_id).map(|node| node.last_heartbeat)
    }

    /// Gets a pod snapshot by id.
    pub fn pod(&self, pod_id: &str) -> Option<PodInfo> {
        let inner = self.inner.read();
        inner.pods.get(pod_id).map(|entry| PodInfo {
            id: pod_id.to_owned(),
            cpu_required: entry.cpu_required,
            assigned_node: entry.assigned_node.clone(),
        })
    }

    /// Lists all pod snapshots.
    pub fn pods(&self) -> Vec<PodInfo> {
        let inner = self.inner.read();
        inner
            .pods
            .iter()
            .map(|(id, entry)| PodInfo {
                id: id.clone(),
                cpu_required: entry.cpu_required,
                assigned_node: entry.assigned_node.clone(),
            })
            .collect()
    }
}

impl Default for ClusterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot(node_id: &str, entry: &NodeEntry) -> NodeInfo {
    NodeInfo {
        id: node_id.to_owned(),
        total_cpu: entry.total_cpu,
        available_cpu: entry.available_cpu,
        status: entry.status,
        pods: entry.pods.clone(),
        registered_at: entry.registered_at,
        last_heartbeat: entry.last_heartbeat,
    }
}
