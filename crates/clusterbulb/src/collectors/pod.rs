//! Pod readiness collector.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{Finding, ReportedKeys};
use crate::issues::{pod_key, Issue, IssueRegistry, IssueType};
use crate::k8s::{ClusterInspector, PodStatus};

/// Why a pod is unhealthy, or `None` if it is fine.
///
/// Succeeded pods are healthy. Running pods are healthy when every
/// container is ready. Any other phase is unhealthy.
#[must_use]
pub fn pod_problem(pod: &PodStatus) -> Option<String> {
    match pod.phase.as_str() {
        "Succeeded" => None,
        "Running" => pod
            .container_statuses
            .iter()
            .any(|cs| !cs.ready)
            .then(|| format!("{}/{} has containers not ready", pod.namespace, pod.name)),
        phase => Some(format!(
            "{}/{} in unexpected phase: {phase}",
            pod.namespace, pod.name
        )),
    }
}

#[derive(Debug, Default)]
pub struct PodCollector {
    reported: ReportedKeys,
}

impl PodCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// List pods in all namespaces and judge each one. `None` when the
    /// listing failed.
    pub async fn observe(&self, inspector: &dyn ClusterInspector) -> Option<Vec<Finding>> {
        let pods = match inspector.list_pods().await {
            Ok(pods) => pods,
            Err(e) => {
                warn!(error = %e, "Error fetching pods, keeping previous pod issues");
                return None;
            }
        };

        debug!(pods = pods.len(), "Pod check complete");
        Some(
            pods.iter()
                .map(|pod| Finding {
                    key: pod_key(&pod.namespace, &pod.name),
                    problem: pod_problem(pod),
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
        self.reported.record(findings, IssueType::Pod, registry, now)
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
