//! Warning event collector.
//!
//! Recent warning events are only escalated when the object they point at is
//! still unhealthy right now; an event about a pod that has since recovered
//! clears its key instead.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{node_problem, pod_problem, Finding, ReportedKeys};
use crate::issues::{event_key, Issue, IssueRegistry, IssueType};
use crate::k8s::{ClusterEvent, ClusterInspector};

/// Time windows for event handling. The two are independent.
#[derive(Debug, Clone, Copy)]
pub struct EventSettings {
    /// Events last seen before `now - lookback` are ignored.
    pub lookback: Duration,
    /// A key repeated within this window of its first sighting in a pass is
    /// suppressed.
    pub dedup_window: Duration,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::seconds(10),
            dedup_window: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventCollector {
    settings: EventSettings,
    reported: ReportedKeys,
}

impl EventCollector {
    #[must_use]
    pub fn new(settings: EventSettings) -> Self {
        Self {
            settings,
            reported: ReportedKeys::default(),
        }
    }

    /// Recent warning events, each judged by re-checking the object it
    /// refers to. `None` when the listing failed.
    pub async fn observe(
        &self,
        inspector: &dyn ClusterInspector,
        now: DateTime<Utc>,
    ) -> Option<Vec<Finding>> {
        let since = now - self.settings.lookback;
        let events = match inspector.list_warning_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Error fetching events, keeping previous event issues");
                return None;
            }
        };

        let mut findings = vec![];
        let mut seen: HashMap<String, DateTime<Utc>> = HashMap::new();

        for event in &events {
            if !event.is_warning() {
                continue;
            }
            let Some(last_seen) = event.last_seen.filter(|t| *t >= since) else {
                continue;
            };

            let key = event_key(&event.namespace, &event.involved_object.name, &event.reason);
            if let Some(first) = seen.get(&key) {
                if now - *first < self.settings.dedup_window {
                    continue;
                }
            }
            seen.insert(key.clone(), last_seen);

            let problem = object_unhealthy(inspector, event).await.then(|| {
                format!(
                    "{}/{}: {} - {}",
                    event.namespace, event.involved_object.name, event.reason, event.message
                )
            });
            findings.push(Finding { key, problem });
        }

        debug!(events = events.len(), considered = findings.len(), "Event check complete");
        Some(findings)
    }

    pub fn apply(
        &mut self,
        findings: Option<Vec<Finding>>,
        registry: &mut IssueRegistry,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        self.reported.record(findings, IssueType::Event, registry, now)
    }

    pub async fn collect(
        &mut self,
        inspector: &dyn ClusterInspector,
        registry: &mut IssueRegistry,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        let findings = self.observe(inspector, now).await;
        self.apply(findings, registry, now)
    }
}

/// Re-check the object an event refers to. Anything that cannot be
/// confirmed healthy counts as unhealthy.
async fn object_unhealthy(inspector: &dyn ClusterInspector, event: &ClusterEvent) -> bool {
    let object = &event.involved_object;
    match object.kind.as_str() {
        "Pod" => {
            let namespace = object.namespace.as_deref().unwrap_or(&event.namespace);
            match inspector.get_pod(namespace, &object.name).await {
                Ok(Some(pod)) => pod_problem(&pod).is_some(),
                Ok(None) => true,
                Err(e) => {
                    debug!(error = %e, pod = %object.name, "Pod lookup failed, assuming unhealthy");
                    true
                }
            }
        }
        "Node" => match inspector.get_node(&object.name).await {
            Ok(Some(node)) => node_problem(&node).is_some(),
            Ok(None) => true,
            Err(e) => {
                debug!(error = %e, node = %object.name, "Node lookup failed, assuming unhealthy");
                true
            }
        },
        _ => true,
    }
}
