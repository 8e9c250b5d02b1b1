//! Node readiness collector.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{Finding, ReportedKeys};
use crate::issues::{node_key, Issue, IssueRegistry, IssueType};
use crate::k8s::{ClusterInspector, NodeStatus};

/// Why a node is unhealthy, or `None` if its `Ready` condition is true.
#[must_use]
pub fn node_problem(node: &NodeStatus) -> Option<String> {
    (!node.ready).then(|| format!("{} is not ready", node.name))
}

#[derive(Debug, Default)]
pub struct NodeCollector {
    reported: ReportedKeys,
}

impl NodeCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// List nodes and judge each one. `None` when the listing failed.
    pub async fn observe(&self, inspector: &dyn ClusterInspector) -> Option<Vec<Finding>> {
        let nodes = match inspector.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Error fetching nodes, keeping previous node issues");
                return None;
            }
        };

        debug!(nodes = nodes.len(), "Node check complete");
        Some(
            nodes
                .iter()
                .map(|node| Finding {
                    key: node_key(&node.name),
                    problem: node_problem(node),
                })
                .collect(),
        )
    }

    pub fn apply(
        &mut self,
        findings: Option<Vec<Finding>>,
        registry: &mut IssueRegistry,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        self.reported.record(findings, IssueType::Node, registry, now)
    }

    pub async fn collect(
        &mut self,
        inspector: &dyn ClusterInspector,
        registry: &mut IssueRegistry,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        let findings = self.observe(inspector).await;
        self.apply(findings, registry, now)
    }
}
