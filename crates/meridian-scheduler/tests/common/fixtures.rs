//! Test fixtures for cluster integration tests.

use meridian_scheduler::{ClusterRegistry, NodeId};

/// Registers one node per capacity, returning ids in registration order.
pub fn register_nodes(registry: &ClusterRegistry, capacities: &[u32]) -> Vec<NodeId> {
    capacities
        .iter()
        .map(|&cpu| registry.register(cpu).expect("register node"))
        .collect()
}

/// Asserts the capacity invariant for every node: available CPU plus the
/// sum of assigned pod requirements equals total CPU.
pub fn assert_capacity_invariant(registry: &ClusterRegistry) {
    for node in registry.nodes() {
        let assigned: u32 = node
            .pods
            .iter()
            .map(|pod_id| registry.pod(pod_id).expect("pod record").cpu_required)
            .sum();
        assert_eq!(
            node.available_cpu + assigned,
            node.total_cpu,
            "capacity invariant violated for node {}",
            node.id
        );
    }
}

/// Asserts node/pod cross-references agree, tolerating the listed orphans.
pub fn assert_bidirectional_consistency(registry: &ClusterRegistry, orphans: &[String]) {
    for node in registry.nodes() {
        for pod_id in &node.pods {
            let pod = registry.pod(pod_id).expect("pod record");
            assert_eq!(
                pod.assigned_node, node.id,
                "pod {pod_id} does not point back at node {}",
                node.id
            );
        }
    }

    for pod in registry.pods() {
        if orphans.contains(&pod.id) {
            // Orphaned pods appear in no node's list.
            for node in registry.nodes() {
                assert!(
                    !node.pods.contains(&pod.id),
                    "orphaned pod {} still assigned to node {}",
                    pod.id,
                    node.id
                );
            }
        } else {
            let node = registry.node(&pod.assigned_node).expect("assigned node");
            assert!(
                node.pods.contains(&pod.id),
                "node {} does not list pod {}",
                node.id,
                pod.id
            );
        }
    }
}
