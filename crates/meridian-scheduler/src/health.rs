//! Heartbeat-driven health monitoring and pod rescheduling.

use std::sync::Arc;
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::HealthConfig;
use crate::placement::StrategyKind;
use crate::registry::{ClusterRegistry, NodeId, NodeStatus, PodId};

/// Periodic monitor that flips node status on heartbeat staleness and
/// reschedules pods off failed nodes.
#[derive(Debug)]
pub struct HealthMonitor {
    config: HealthConfig,
    registry: Arc<ClusterRegistry>,
}

/// Outcome of a single monitor tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Nodes that went Healthy -> Failed this tick.
    pub failed: Vec<NodeId>,
    /// Nodes that went Failed -> Healthy this tick.
    pub recovered: Vec<NodeId>,
    /// Evicted pods that found a new node, with their destination.
    pub rescheduled: Vec<(PodId, NodeId)>,
    /// Evicted pods no healthy node could hold.
    pub orphaned: Vec<PodId>,
}

impl HealthMonitor {
    /// Creates a new health monitor over the given registry.
    pub fn new(config: HealthConfig, registry: Arc<ClusterRegistry>) -> Self {
        Self { config, registry }
    }

    /// Runs the monitor loop until the token is cancelled.
    ///
    /// Ticks are strictly sequential: the next one is not scheduled until
    /// the current one returns, so they never overlap. Cancellation lets an
    /// in-flight tick finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.monitor_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("health monitor stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick(Instant::now());
                    for node_id in &report.failed {
                        warn!(node_id = %node_id, "node missed heartbeat deadline, marked failed");
                    }
                    for node_id in &report.recovered {
                        info!(node_id = %node_id, "node heartbeat resumed, marked healthy");
                    }
                    for (pod_id, node_id) in &report.rescheduled {
                        info!(pod_id = %pod_id, node_id = %node_id, "pod rescheduled");
                    }
                    for pod_id in &report.orphaned {
                        warn!(pod_id = %pod_id, "pod could not be rescheduled, orphaned");
                    }
                }
            }
        }
    }

    /// Evaluates every node once against the heartbeat timeout.
    ///
    /// Transitions are level-triggered: a recovery is observed on the first
    /// tick after a fresh heartbeat lands, not when it lands. A problem
    /// with one node never stops the scan of the rest.
    pub fn tick(&self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        let timeout = self.config.heartbeat_timeout;

        for node in self.registry.nodes() {
            let elapsed = now.saturating_duration_since(node.last_heartbeat);

            match node.status {
                NodeStatus::Healthy if elapsed > timeout => {
                    if let Err(e) = self.registry.set_status(&node.id, NodeStatus::Failed) {
                        warn!(node_id = %node.id, error = %e, "failed to update node status");
                        continue;
                    }
                    report.failed.push(node.id.clone());
                    self.reschedule_evicted(&node.id, &mut report);
                }
                NodeStatus::Failed if elapsed <= timeout => {
                    if let Err(e) = self.registry.set_status(&node.id, NodeStatus::Healthy) {
                        warn!(node_id = %node.id, error = %e, "failed to update node status");
                        continue;
                    }
                    // The node comes back empty at full capacity; pods
                    // migrated away are not reclaimed.
                    report.recovered.push(node.id.clone());
                }
                _ => {}
            }
        }

        report
    }

    /// Evicts a failed node's pods and tries each one exactly once on the
    /// remaining healthy capacity. Pods that fit nowhere stay orphaned
    /// until capacity changes; there is no retry within the tick.
    fn reschedule_evicted(&self, node_id: &str, report: &mut TickReport) {
        let evicted = self.registry.release_all(node_id);
        let algorithm = StrategyKind::FirstFit.algorithm();

        for pod_id in evicted {
            let pod = match self.registry.pod(&pod_id) {
                Some(pod) => pod,
                None => {
                    warn!(pod_id = %pod_id, "evicted pod has no record, skipping");
                    continue;
                }
            };

            // Fresh snapshot per pod: earlier rebinds consume capacity.
            let candidates = self.registry.nodes();
            match algorithm.select(pod.cpu_required, &candidates) {
                Some(target) => {
                    if self.registry.rebind_pod(&pod_id, &target) {
                        report.rescheduled.push((pod_id, target));
                    } else {
                        report.orphaned.push(pod_id);
                    }
                }
                None => report.orphaned.push(pod_id),
            }
        }
    }
}
