//! Health collectors.
//!
//! Each collector runs once per collection pass against a fresh listing from
//! the [`ClusterInspector`](crate::k8s::ClusterInspector), reports or clears
//! keys in the [`IssueRegistry`], and returns the issues it found.
//!
//! A failed listing is fail-open: the collector returns no issues and leaves
//! its registry entries from the previous pass untouched, so a flaky API
//! server never reads as "everything healed".

pub mod event;
pub mod node;
pub mod pod;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::issues::{Issue, IssueRegistry, IssueType};

pub use event::{EventCollector, EventSettings};
pub use node::{node_problem, NodeCollector};
pub use pod::{pod_problem, PodCollector};

/// Health verdict for one resource, decided without touching the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub key: String,
    /// `None` when the resource is healthy.
    pub problem: Option<String>,
}

/// Keys a collector reported unhealthy on its last successful pass.
///
/// Used to clear keys whose resource disappeared from the listing, since
/// those are never visited again to be cleared explicitly.
#[derive(Debug, Default)]
pub(crate) struct ReportedKeys {
    keys: HashSet<String>,
}

impl ReportedKeys {
    /// Apply one pass's findings to `registry` and return the issues.
    ///
    /// `None` is a failed listing: nothing is reported, cleared or forgotten.
    pub(crate) fn record(
        &mut self,
        findings: Option<Vec<Finding>>,
        issue_type: IssueType,
        registry: &mut IssueRegistry,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        let Some(findings) = findings else {
            return vec![];
        };

        let mut issues = vec![];
        let mut unhealthy = HashSet::new();

        for Finding { key, problem } in findings {
            match problem {
                Some(message) => {
                    mark_unhealthy(registry, &key, &message, now);
                    unhealthy.insert(key.clone());
                    issues.push(Issue::new(key, issue_type, message, now));
                }
                None => mark_healthy(registry, &key),
            }
        }

        self.reconcile(registry, unhealthy);
        issues
    }

    /// Replace the tracked set with `current`, clearing every key that was
    /// reported last pass but not this one.
    fn reconcile(&mut self, registry: &mut IssueRegistry, current: HashSet<String>) {
        for stale in self.keys.difference(&current) {
            if let Some(last_seen) = registry.last_seen(stale) {
                registry.clear(stale);
                info!(key = %stale, %last_seen, "Issue resolved (no longer listed)");
            }
        }
        self.keys = current;
    }
}

fn mark_unhealthy(registry: &mut IssueRegistry, key: &str, message: &str, at: DateTime<Utc>) {
    if registry.report_at(key, at) {
        warn!(key = %key, message = %message, "Issue detected");
    }
}

fn mark_healthy(registry: &mut IssueRegistry, key: &str) {
    if let Some(last_seen) = registry.last_seen(key) {
        registry.clear(key);
        info!(key = %key, %last_seen, "Issue resolved");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`ClusterInspector`] for collector tests.

    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::k8s::{ClusterEvent, ClusterInspector, InspectError, NodeStatus, PodStatus};

    #[derive(Default)]
    pub struct FakeCluster {
        nodes: Mutex<Option<Vec<NodeStatus>>>,
        pods: Mutex<Option<Vec<PodStatus>>>,
        events: Mutex<Option<Vec<ClusterEvent>>>,
    }

    impl FakeCluster {
        pub fn set_nodes(&self, nodes: Option<Vec<NodeStatus>>) {
            *self.nodes.lock().unwrap() = nodes;
        }

        pub fn set_pods(&self, pods: Option<Vec<PodStatus>>) {
            *self.pods.lock().unwrap() = pods;
        }

        pub fn set_events(&self, events: Option<Vec<ClusterEvent>>) {
            *self.events.lock().unwrap() = events;
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
}
