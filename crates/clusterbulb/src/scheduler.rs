//! The monitor loop.
//!
//! Three independent timers (emit, collect, pull-request poll) and a
//! shutdown future feed one `select!` loop. Whichever fires runs to
//! completion before the next is considered, so task bodies never overlap.
//! Shared fields live behind the single [`SharedState`] lock, taken only to
//! apply results, so other readers never wait on cluster or network calls.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::collectors::{EventCollector, EventSettings, NodeCollector, PodCollector};
use crate::emitter::ColorEmitter;
use crate::error::MonitorError;
use crate::k8s::ClusterInspector;
use crate::light::Rgb;
use crate::pulls::{PollOutcome, PullRequestWatcher};
use crate::report::ReportWriter;
use crate::state::{HealthReport, SharedState};

/// Timer periods for the three tasks.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub emit: Duration,
    pub collect: Duration,
    pub pull_requests: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            emit: Duration::from_secs(1),
            collect: Duration::from_secs(10),
            pull_requests: Duration::from_secs(300),
        }
    }
}

pub struct Monitor {
    state: SharedState,
    inspector: Arc<dyn ClusterInspector>,
    nodes: NodeCollector,
    pods: PodCollector,
    events: EventCollector,
    watcher: PullRequestWatcher,
    emitter: ColorEmitter,
    reports: ReportWriter,
    cadence: Cadence,
}

impl Monitor {
    #[must_use]
    pub fn new(
        state: SharedState,
        inspector: Arc<dyn ClusterInspector>,
        watcher: PullRequestWatcher,
        emitter: ColorEmitter,
        cadence: Cadence,
        event_settings: EventSettings,
    ) -> Self {
        Self {
            state,
            inspector,
            nodes: NodeCollector::new(),
            pods: PodCollector::new(),
            events: EventCollector::new(event_settings),
            watcher,
            emitter,
            reports: ReportWriter::default(),
            cadence,
        }
    }

    #[must_use]
    pub fn with_reports(mut self, reports: ReportWriter) -> Self {
        self.reports = reports;
        self
    }

    #[must_use]
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// One collection pass: run all three collectors, re-derive the cluster
    /// state and publish a report.
    ///
    /// Cluster reads happen before the lock is taken; the lock only covers
    /// applying their results.
    pub async fn collect(&mut self) -> HealthReport {
        let now = Utc::now();
        let inspector = self.inspector.as_ref();

        let nodes = self.nodes.observe(inspector).await;
        let pods = self.pods.observe(inspector).await;
        let events = self.events.observe(inspector, now).await;

        let report = {
            let mut shared = self.state.lock().await;
            let node_issues = self.nodes.apply(nodes, &mut shared.registry, now);
            let pod_issues = self.pods.apply(pods, &mut shared.registry, now);
            let event_issues = self.events.apply(events, &mut shared.registry, now);

            if let Some(previous) = shared.rederive() {
                info!(
                    from = %previous,
                    to = %shared.cluster_state,
                    issues = shared.registry.count(),
                    "Cluster state changed"
                );
            }

            let report = HealthReport {
                timestamp: now,
                node_issues,
                pod_issues,
                event_issues,
                pull_requests: shared.pull_requests.clone(),
                total_issues: shared.registry.count(),
                cluster_state: shared.cluster_state,
            };
            shared.last_report = Some(report.clone());
            report
        };

        if let Err(e) = self.reports.write(&report) {
            warn!(error = %e, "Failed to export health report");
        }

        report
    }

    /// Emit the color for the current cluster state.
    pub async fn emit(&mut self) -> Rgb {
        let state = self.state.lock().await.cluster_state;
        self.emitter.tick(state).await
    }

    pub async fn poll_pull_requests(&mut self) -> Result<PollOutcome, MonitorError> {
        Ok(self.watcher.poll(&self.state).await?)
    }

    /// Run until `shutdown` resolves or the error budget runs out.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), MonitorError>
    where
        F: Future<Output = ()>,
    {
        let mut emit = interval(self.cadence.emit);
        let mut collect = interval(self.cadence.collect);
        let mut pull_requests = interval(self.cadence.pull_requests);
        for timer in [&mut emit, &mut collect, &mut pull_requests] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        info!(
            emit_secs = self.cadence.emit.as_secs_f64(),
            collect_secs = self.cadence.collect.as_secs_f64(),
            pull_request_secs = self.cadence.pull_requests.as_secs_f64(),
            "Scheduler started"
        );

        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Scheduler stopped");
                    break Ok(());
                }
                _ = collect.tick() => {
                    self.collect().await;
                }
                _ = pull_requests.tick() => {
                    if let Err(e) = self.poll_pull_requests().await {
                        break Err(e);
                    }
                }
                _ = emit.tick() => {
                    self.emit().await;
                }
            }
        };

        self.watcher.drain_notifications().await;
        result
    }
}
