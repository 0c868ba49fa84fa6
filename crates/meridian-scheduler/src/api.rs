//! HTTP API handlers for the cluster manager.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::PlacementConfig;
use crate::error::ClusterError;
use crate::placement::{place_pod, StrategyKind};
use crate::registry::{ClusterRegistry, NodeInfo, NodeStatus, PodInfo};

/// Shared application state.
pub struct AppState {
    pub registry: Arc<ClusterRegistry>,
    pub placement: PlacementConfig,
}

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Service endpoints
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Node management
        .route("/nodes", post(register_node))
        .route("/nodes", get(list_nodes))
        .route("/nodes/{id}", get(get_node))
        .route("/nodes/{id}/heartbeat", post(heartbeat))
        // Pod placement
        .route("/pods", post(launch_pod))
        .route("/pods", get(list_pods))
        // Metrics
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Wraps core errors for HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub ClusterError);

impl From<ClusterError> for ApiError {
    fn from(e: ClusterError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClusterError::InvalidCapacity(_) | ClusterError::UnknownStrategy(_) => {
                StatusCode::BAD_REQUEST
            }
            ClusterError::UnknownNode(_) | ClusterError::UnknownPod(_) => StatusCode::NOT_FOUND,
            ClusterError::NoSuitableNode { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ClusterError::Config(_) | ClusterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

/// Readiness check endpoint.
async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let nodes = state.registry.len();
    if nodes > 0 {
        (StatusCode::OK, Json(ReadyResponse { ready: true, nodes }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                nodes: 0,
            }),
        )
    }
}

/// Register a new node.
async fn register_node(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterNodeRequest>,
) -> Result<(StatusCode, Json<RegisterNodeResponse>), ApiError> {
    let cpu_cores = validate_cpu(request.cpu_cores)?;
    let node_id = state.registry.register(cpu_cores)?;
    info!(node_id = %node_id, cpu_cores, "node registered");
    Ok((StatusCode::CREATED, Json(RegisterNodeResponse { node_id })))
}

/// List all nodes.
async fn list_nodes(State(state): State<Arc<AppState>>) -> Json<Vec<NodeResponse>> {
    let nodes = state.registry.nodes();
    Json(nodes.into_iter().map(NodeResponse::from).collect())
}

/// Get a specific node.
async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NodeResponse>, ApiError> {
    state
        .registry
        .node(&id)
        .map(|node| Json(NodeResponse::from(node)))
        .ok_or_else(|| ApiError(ClusterError::UnknownNode(id)))
}

/// Record a heartbeat for a node.
async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.touch(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Launch a pod onto a node chosen by the requested strategy.
async fn launch_pod(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LaunchPodRequest>,
) -> Result<(StatusCode, Json<LaunchPodResponse>), ApiError> {
    let cpu_required = validate_cpu(request.cpu_required)?;

    // A missing strategy falls back to the configured default; an
    // unrecognised one is an explicit error.
    let strategy = match request.strategy.as_deref() {
        Some(name) => StrategyKind::parse(name)
            .ok_or_else(|| ApiError(ClusterError::UnknownStrategy(name.to_owned())))?,
        None => state.placement.default_strategy,
    };

    let (pod_id, node_id) = place_pod(&state.registry, strategy, cpu_required)?;
    info!(
        pod_id = %pod_id,
        node_id = %node_id,
        strategy = strategy.name(),
        "pod launched"
    );

    Ok((
        StatusCode::CREATED,
        Json(LaunchPodResponse {
            pod_id,
            node_id,
            strategy: strategy.name(),
        }),
    ))
}

/// List all pods.
async fn list_pods(State(state): State<Arc<AppState>>) -> Json<Vec<PodResponse>> {
    let pods = state.registry.pods();
    Json(pods.into_iter().map(PodResponse::from).collect())
}

/// Metrics endpoint.
async fn metrics(State(state): State<Arc<AppState>>) -> String {
    let nodes = state.registry.nodes();
    let healthy = nodes
        .iter()
        .filter(|n| n.status == NodeStatus::Healthy)
        .count();
    let total_cpu: u32 = nodes.iter().map(|n| n.total_cpu).sum();
    let available_cpu: u32 = nodes.iter().map(|n| n.available_cpu).sum();

    format!(
        "# HELP cluster_nodes_total Total number of registered nodes\n\
         # TYPE cluster_nodes_total gauge\n\
         cluster_nodes_total {}\n\n\
         # HELP cluster_nodes_healthy Number of healthy nodes\n\
         # TYPE cluster_nodes_healthy gauge\n\
         cluster_nodes_healthy {}\n\n\
         # HELP cluster_cpu_total Total CPU capacity across all nodes\n\
         # TYPE cluster_cpu_total gauge\n\
         cluster_cpu_total {}\n\n\
         # HELP cluster_cpu_available Unreserved CPU across all nodes\n\
         # TYPE cluster_cpu_available gauge\n\
         cluster_cpu_available {}\n\n\
         # HELP cluster_pods_total Total number of pods\n\
         # TYPE cluster_pods_total gauge\n\
         cluster_pods_total {}\n",
        nodes.len(),
        healthy,
        total_cpu,
        available_cpu,
        state.registry.pods().len(),
    )
}

fn validate_cpu(value: i64) -> Result<u32, ApiError> {
    u32::try_from(value)
        .ok()
        .filter(|cpu| *cpu > 0)
        .ok_or(ApiError(ClusterError::InvalidCapacity(value)))
}

// Request types

#[derive(Debug, Deserialize)]
pub struct RegisterNodeRequest {
    pub cpu_cores: i64,
}

#[derive(Debug, Deserialize)]
pub struct LaunchPodRequest {
    pub cpu_required: i64,
    pub strategy: Option<String>,
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    nodes: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterNodeResponse {
    pub node_id: String,
}

#[derive(Debug, Serialize)]
pub struct LaunchPodResponse {
    pub pod_id: String,
    pub node_id: String,
    pub strategy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct NodeResponse {
    pub id: String,
    pub total_cpu: u32,
    pub available_cpu: u32,
    pub status: NodeStatus,
    pub pods: Vec<String>,
    pub registered_at_secs_ago: u64,
    pub last_heartbeat_secs_ago: u64,
}

impl From<NodeInfo> for NodeResponse {
    fn from(node: NodeInfo) -> Self {
        Self {
            id: node.id,
            total_cpu: node.total_cpu,
            available_cpu: node.available_cpu,
            status: node.status,
            pods: node.pods,
            registered_at_secs_ago: node.registered_at.elapsed().as_secs(),
            last_heartbeat_secs_ago: node.last_heartbeat.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PodResponse {
    pub id: String,
    pub cpu_required: u32,
    pub assigned_node: String,
}

impl From<PodInfo> for PodResponse {
    fn from(pod: PodInfo) -> Self {
        Self {
            id: pod.id,
            cpu_required: pod.cpu_required,
            assigned_node: pod.assigned_node,
        }
    }
}
