//! Cluster state derivation and the shared monitor state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::issues::{Issue, IssueRegistry};

/// Overall status driving the indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterState {
    #[default]
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "pull_requests_open")]
    PullRequestsOpen,
    #[serde(rename = "issues_detected")]
    IssuesDetected,
    #[serde(rename = "pull_requests_open|issues_detected")]
    Both,
}

impl ClusterState {
    /// Combine the live issue count and the pull-request flag.
    #[must_use]
    pub const fn derive(total_issues: usize, pull_requests_open: bool) -> Self {
        match (total_issues > 0, pull_requests_open) {
            (false, false) => Self::Healthy,
            (false, true) => Self::PullRequestsOpen,
            (true, false) => Self::IssuesDetected,
            (true, true) => Self::Both,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::PullRequestsOpen => "pull_requests_open",
            Self::IssuesDetected => "issues_detected",
            Self::Both => "pull_requests_open|issues_detected",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only projection of one collection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub node_issues: Vec<Issue>,
    pub pod_issues: Vec<Issue>,
    pub event_issues: Vec<Issue>,
    pub pull_requests: Vec<Issue>,
    pub total_issues: usize,
    pub cluster_state: ClusterState,
}

/// Everything the timer-driven tasks share.
///
/// Only ever touched through [`SharedState`], so every field is guarded by
/// the same lock.
#[derive(Debug, Default)]
pub struct MonitorState {
    pub registry: IssueRegistry,
    pub cluster_state: ClusterState,
    pub pull_requests_open: bool,
    pub pull_requests: Vec<Issue>,
    pub last_report: Option<HealthReport>,
}

impl MonitorState {
    /// Recompute `cluster_state` from the registry and the PR flag.
    ///
    /// Returns the previous state when it changed.
    pub fn rederive(&mut self) -> Option<ClusterState> {
        let next = ClusterState::derive(self.registry.count(), self.pull_requests_open);
        let previous = std::mem::replace(&mut self.cluster_state, next);
        (previous != next).then_some(previous)
    }
}

/// Handle to the single lock guarding [`MonitorState`].
pub type SharedState = Arc<Mutex<MonitorState>>;

#[must_use]
pub fn shared_state() -> SharedState {
    Arc::new(Mutex::new(MonitorState::default()))
}
