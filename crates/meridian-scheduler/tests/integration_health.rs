//! Integration tests for heartbeat tracking and status transitions.

mod common;

use common::fixtures::register_nodes;
use common::TestCluster;
use meridian_scheduler::{place_pod, ClusterError, NodeStatus, StrategyKind};
use std::time::{Duration, Instant};

#[test]
fn registration_counts_as_first_heartbeat() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[4]);

    // Within the timeout nothing happens even without an explicit
    // heartbeat.
    let report = cluster.monitor.tick(Instant::now());
    assert!(report.failed.is_empty());
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Healthy
    );

    // Past the timeout the silent node fails.
    let report = cluster.monitor.tick(Instant::now() + Duration::from_millis(300));
    assert_eq!(report.failed, vec![ids[0].clone()]);
}

#[test]
fn heartbeat_defers_failure() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[4]);

    let later = Instant::now() + Duration::from_millis(300);
    cluster.registry.touch_at(&ids[0], later).unwrap();

    let report = cluster.monitor.tick(later);
    assert!(report.failed.is_empty());
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Healthy
    );
}

#[test]
fn heartbeat_for_unknown_node_fails() {
    let cluster = TestCluster::new();
    assert!(matches!(
        cluster.registry.touch("no-such-node"),
        Err(ClusterError::UnknownNode(_))
    ));
}

#[test]
fn recovery_waits_for_the_next_tick() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[4]);

    let later = Instant::now() + Duration::from_millis(300);
    cluster.monitor.tick(later);
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Failed
    );

    // A fresh heartbeat alone does not flip the status.
    cluster.registry.touch_at(&ids[0], later).unwrap();
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Failed
    );

    // The next tick observes it.
    let report = cluster.monitor.tick(later);
    assert_eq!(report.recovered, vec![ids[0].clone()]);
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Healthy
    );
}

#[test]
fn stale_failed_node_stays_failed() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[4]);

    let later = Instant::now() + Duration::from_millis(300);
    cluster.monitor.tick(later);

    // Still silent: repeated ticks leave it failed without re-evicting.
    let report = cluster.monitor.tick(later + Duration::from_millis(300));
    assert!(report.failed.is_empty());
    assert!(report.recovered.is_empty());
    assert_eq!(
        cluster.registry.node(&ids[0]).unwrap().status,
        NodeStatus::Failed
    );
}

#[test]
fn one_failing_node_does_not_stop_the_scan() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[2, 4, 2]);

    let (pod_id, _) = place_pod(&cluster.registry, StrategyKind::FirstFit, 2).expect("placement");

    // First and third nodes go silent; the middle one heartbeats.
    let later = Instant::now() + Duration::from_millis(300);
    cluster.registry.touch_at(&ids[1], later).unwrap();

    let report = cluster.monitor.tick(later);
    assert_eq!(report.failed, vec![ids[0].clone(), ids[2].clone()]);
    assert_eq!(report.rescheduled, vec![(pod_id, ids[1].clone())]);
    assert_eq!(
        cluster.registry.node(&ids[1]).unwrap().status,
        NodeStatus::Healthy
    );
}

#[test]
fn orphaned_pod_is_not_retried_on_later_ticks() {
    let cluster = TestCluster::with_fast_timeouts();
    let ids = register_nodes(&cluster.registry, &[4]);
    let (pod_id, _) = place_pod(&cluster.registry, StrategyKind::FirstFit, 2).expect("placement");

    let later = Instant::now() + Duration::from_millis(300);
    let report = cluster.monitor.tick(later);
    assert_eq!(report.orphaned, vec![pod_id.clone()]);

    // The node recovers with free capacity, but the orphan stays orphaned.
    cluster.registry.touch_at(&ids[0], later).unwrap();
    let report = cluster.monitor.tick(later);
    assert_eq!(report.recovered, vec![ids[0].clone()]);
    assert!(report.rescheduled.is_empty());

    let pod = cluster.registry.pod(&pod_id).unwrap();
    assert_eq!(pod.assigned_node, ids[0]);
    assert!(cluster.registry.node(&ids[0]).unwrap().pods.is_empty());
}

#[tokio::test]
async fn monitor_loop_stops_on_cancellation() {
    use tokio_util::sync::CancellationToken;

    let cluster = TestCluster::with_fast_timeouts();
    let cancel = CancellationToken::new();

    let monitor = cluster.monitor;
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        monitor.run(loop_cancel).await;
    });

    // Let it tick at least once, then ask it to stop.
    tokio::time::sleep(Duration::from_millis(120)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor loop should stop promptly")
        .expect("monitor task should not panic");
}
