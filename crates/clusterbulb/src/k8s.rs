//! Kubernetes inspection: simplified resource records and the read-only
//! client the collectors consume.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, Node, Pod};
use kube::api::{Api, ListParams};
use kube::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from the cluster-inspection collaborator.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Kubernetes API request failed
    #[error("Kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),

    /// Inspector could not answer for another reason
    #[error("cluster inspection unavailable: {0}")]
    Unavailable(String),
}

/// Simplified Node representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    /// `Ready` condition reported `True`.
    pub ready: bool,
}

/// Container readiness within a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
}

/// Simplified Pod representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodStatus {
    pub name: String,
    pub namespace: String,
    /// `Pending`, `Running`, `Succeeded`, `Failed` or `Unknown`.
    pub phase: String,
    pub container_statuses: Vec<ContainerStatus>,
}

/// Reference to the object an event is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

/// Simplified Event representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub namespace: String,
    /// `Normal` or `Warning`.
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub involved_object: ObjectRef,
    pub last_seen: Option<DateTime<Utc>>,
}

impl ClusterEvent {
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.event_type == "Warning"
    }
}

impl From<&Node> for NodeStatus {
    fn from(node: &Node) -> Self {
        let ready = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            });

        Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            ready,
        }
    }
}

impl From<&Pod> for PodStatus {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        let phase = status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let container_statuses = status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|cs| ContainerStatus {
                        name: cs.name.clone(),
                        ready: cs.ready,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            phase,
            container_statuses,
        }
    }
}

impl From<&Event> for ClusterEvent {
    fn from(event: &Event) -> Self {
        let involved = &event.involved_object;
        let last_seen = event
            .last_timestamp
            .as_ref()
            .map(|t| t.0)
            .or_else(|| event.event_time.as_ref().map(|t| t.0));

        Self {
            namespace: event.metadata.namespace.clone().unwrap_or_default(),
            event_type: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            involved_object: ObjectRef {
                kind: involved.kind.clone().unwrap_or_default(),
                name: involved.name.clone().unwrap_or_default(),
                namespace: involved.namespace.clone(),
            },
            last_seen,
        }
    }
}

/// Read-only view of the cluster.
#[async_trait]
pub trait ClusterInspector: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeStatus>, InspectError>;

    /// Pods across all namespaces.
    async fn list_pods(&self) -> Result<Vec<PodStatus>, InspectError>;

    /// Warning events across all namespaces.
    async fn list_warning_events(&self) -> Result<Vec<ClusterEvent>, InspectError>;

    /// `Ok(None)` when the pod does not exist.
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<PodStatus>, InspectError>;

    /// `Ok(None)` when the node does not exist.
    async fn get_node(&self, name: &str) -> Result<Option<NodeStatus>, InspectError>;
}

/// [`ClusterInspector`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeInspector {
    client: Client,
}

impl KubeInspector {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the in-cluster service account, falling back to
    /// the local kubeconfig.
    pub async fn try_default() -> Result<Self, InspectError> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait]
impl ClusterInspector for KubeInspector {
    async fn list_nodes(&self) -> Result<Vec<NodeStatus>, InspectError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        debug!(count = list.items.len(), "Listed nodes");
        Ok(list.items.iter().map(NodeStatus::from).collect())
    }

    async fn list_pods(&self) -> Result<Vec<PodStatus>, InspectError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods.list(&ListParams::default()).await?;
        debug!(count = list.items.len(), "Listed pods");
        Ok(list.items.iter().map(PodStatus::from).collect())
    }

    async fn list_warning_events(&self) -> Result<Vec<ClusterEvent>, InspectError> {
        let events: Api<Event> = Api::all(self.client.clone());
        let list = events
            .list(&ListParams::default().fields("type=Warning"))
            .await?;
        debug!(count = list.items.len(), "Listed warning events");
        Ok(list.items.iter().map(ClusterEvent::from).collect())
    }

    async fn get_pod(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PodStatus>, InspectError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.get_opt(name).await?.as_ref().map(PodStatus::from))
    }

    async fn get_node(&self, name: &str) -> Result<Option<NodeStatus>, InspectError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.get_opt(name).await?.as_ref().map(NodeStatus::from))
    }
}
