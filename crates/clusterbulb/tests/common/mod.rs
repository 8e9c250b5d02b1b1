//! In-memory collaborators for driving the monitor without a cluster.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clusterbulb::github::{GitHubError, PullRequest, PullRequestSource, User};
use clusterbulb::k8s::{
    ClusterEvent, ClusterInspector, ContainerStatus, InspectError, NodeStatus, PodStatus,
};
use clusterbulb::light::{Light, LightError, Rgb};
use notify::{ChannelError, NotifyChannel, NotifyEvent};

/// Cluster whose listings can be swapped between passes. `None` fails the
/// listing.
#[derive(Default)]
pub struct FakeCluster {
    nodes: Mutex<Option<Vec<NodeStatus>>>,
    pods: Mutex<Option<Vec<PodStatus>>>,
    events: Mutex<Option<Vec<ClusterEvent>>>,
    listing_delay: Mutex<Duration>,
}

impl FakeCluster {
    pub fn healthy() -> Arc<Self> {
        let cluster = Self::default();
        cluster.set_nodes(Some(vec![]));
        cluster.set_pods(Some(vec![]));
        cluster.set_events(Some(vec![]));
        Arc::new(cluster)
    }

    pub fn set_nodes(&self, nodes: Option<Vec<NodeStatus>>) {
        *self.nodes.lock().unwrap() = nodes;
    }

    pub fn set_pods(&self, pods: Option<Vec<PodStatus>>) {
        *self.pods.lock().unwrap() = pods;
    }

    pub fn set_events(&self, events: Option<Vec<ClusterEvent>>) {
        *self.events.lock().unwrap() = events;
    }

    /// Make every node listing take `delay`.
    pub fn set_listing_delay(&self, delay: Duration) {
        *self.listing_delay.lock().unwrap() = delay;
    }
}

fn listing<T: Clone>(slot: &Mutex<Option<Vec<T>>>) -> Result<Vec<T>, InspectError> {
    slot.lock()
        .unwrap()
        .clone()
        .ok_or_else(|| InspectError::Unavailable("listing failed".to_string()))
}

#[async_trait]
impl ClusterInspector for FakeCluster {
    async fn list_nodes(&self) -> Result<Vec<NodeStatus>, InspectError> {
        let delay = *self.listing_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        listing(&self.nodes)
    }

    async fn list_pods(&self) -> Result<Vec<PodStatus>, InspectError> {
        listing(&self.pods)
    }

    async fn list_warning_events(&self) -> Result<Vec<ClusterEvent>, InspectError> {
        listing(&self.events)
    }

    async fn get_pod(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PodStatus>, InspectError> {
        Ok(listing(&self.pods)?
            .into_iter()
            .find(|p| p.namespace == namespace && p.name == name))
    }

    async fn get_node(&self, name: &str) -> Result<Option<NodeStatus>, InspectError> {
        Ok(listing(&self.nodes)?.into_iter().find(|n| n.name == name))
    }
}

pub fn node(name: &str, ready: bool) -> NodeStatus {
    NodeStatus {
        name: name.to_string(),
        ready,
    }
}

pub fn running_pod(namespace: &str, name: &str, ready: bool) -> PodStatus {
    PodStatus {
        name: name.to_string(),
        namespace: namespace.to_string(),
        phase: "Running".to_string(),
        container_statuses: vec![ContainerStatus {
            name: "app".to_string(),
            ready,
        }],
    }
}

/// Light that remembers every color it was asked to show.
#[derive(Default)]
pub struct RecordingLight {
    colors: Mutex<Vec<Rgb>>,
}

impl RecordingLight {
    pub fn colors(&self) -> Vec<Rgb> {
        self.colors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Light for RecordingLight {
    async fn set_color(&self, color: Rgb) -> Result<(), LightError> {
        self.colors.lock().unwrap().push(color);
        Ok(())
    }
}

/// Repository whose open pull requests can be swapped; `None` fails the fetch.
pub struct FakeRepository {
    open: Mutex<Option<Vec<u64>>>,
    pub fetches: AtomicUsize,
}

impl FakeRepository {
    pub fn with_open(numbers: Option<Vec<u64>>) -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(numbers),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set_open(&self, numbers: Option<Vec<u64>>) {
        *self.open.lock().unwrap() = numbers;
    }
}

#[async_trait]
impl PullRequestSource for FakeRepository {
    fn repository(&self) -> String {
        "clustershed/homelab".to_string()
    }

    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>, GitHubError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let open = self.open.lock().unwrap().clone();
        open.map(|numbers| {
            numbers
                .into_iter()
                .map(|number| PullRequest {
                    number,
                    title: format!("Change #{number}"),
                    user: User {
                        login: "renovate".to_string(),
                    },
                    state: "open".to_string(),
                    html_url: String::new(),
                    created_at: None,
                    updated_at: None,
                })
                .collect()
        })
        .ok_or(GitHubError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Notification channel that counts what it delivered, each send taking
/// `delay`.
#[derive(Default)]
pub struct CountingChannel {
    pub sent: AtomicUsize,
    delay: Duration,
}

impl CountingChannel {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            sent: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotifyChannel for CountingChannel {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, _event: &NotifyEvent) -> Result<(), ChannelError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
