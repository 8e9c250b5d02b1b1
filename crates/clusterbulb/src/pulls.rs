//! Pull request watcher and the alert gate in front of it.

use chrono::Utc;
use notify::{Notifier, NotifyEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::budget::{BudgetExhausted, ErrorBudget};
use crate::github::PullRequestSource;
use crate::issues::{pull_request_key, Issue, IssueType};
use crate::state::SharedState;

/// Edge detector for the "pull requests opened" alert.
///
/// Fires once per none→open transition, however long the open state lasts
/// and however many pull requests pile up meanwhile.
#[derive(Debug, Default, Clone)]
pub struct NotificationGate {
    open: bool,
}

impl NotificationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest flag value; `true` means an alert should go out.
    pub fn observe(&mut self, open: bool) -> bool {
        let fire = open && !self.open;
        self.open = open;
        fire
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No repository configured.
    Skipped,
    /// Fetch failed; shared state untouched.
    Failed { remaining_budget: u32 },
    /// Shared state replaced with the fetched list.
    Updated { open: usize, notified: bool },
}

/// Polls the code-review host and maintains the open/none flag.
pub struct PullRequestWatcher {
    source: Option<Arc<dyn PullRequestSource>>,
    notifier: Arc<Notifier>,
    gate: NotificationGate,
    budget: ErrorBudget,
}

impl PullRequestWatcher {
    #[must_use]
    pub fn new(
        source: Option<Arc<dyn PullRequestSource>>,
        notifier: Arc<Notifier>,
        budget: ErrorBudget,
    ) -> Self {
        Self {
            source,
            notifier,
            gate: NotificationGate::new(),
            budget,
        }
    }

    /// Fetch open pull requests and publish them to `state`.
    ///
    /// Fetch failures count against the error budget; exhausting it is the
    /// only error returned.
    pub async fn poll(&mut self, state: &SharedState) -> Result<PollOutcome, BudgetExhausted> {
        let Some(source) = &self.source else {
            return Ok(PollOutcome::Skipped);
        };

        let pulls = match source.open_pull_requests().await {
            Ok(pulls) => pulls,
            Err(e) => {
                let recorded = self.budget.record_failure();
                warn!(
                    repo = %source.repository(),
                    error = %e,
                    failures = self.budget.failures(),
                    remaining = self.budget.remaining(),
                    "Pull request check failed"
                );
                recorded?;
                return Ok(PollOutcome::Failed {
                    remaining_budget: self.budget.remaining(),
                });
            }
        };

        let now = Utc::now();
        let issues: Vec<Issue> = pulls
            .iter()
            .map(|pr| {
                Issue::new(
                    pull_request_key(pr.number),
                    IssueType::PullRequest,
                    pr.title.clone(),
                    now,
                )
            })
            .collect();

        let open = !issues.is_empty();
        let notified = self.gate.observe(open);
        if notified {
            info!(repo = %source.repository(), count = issues.len(), "Pull requests opened");
            self.notifier.notify(NotifyEvent::PullRequestsOpened {
                repository: source.repository(),
                titles: pulls.iter().map(|pr| pr.title.clone()).collect(),
                timestamp: now,
            });
        }

        let count = issues.len();
        {
            let mut shared = state.lock().await;
            if shared.pull_requests_open && !open {
                info!(repo = %source.repository(), "No open pull requests");
            }
            shared.pull_requests_open = open;
            shared.pull_requests = issues;
        }

        debug!(open = count, notified, "Pull request check complete");
        Ok(PollOutcome::Updated {
            open: count,
            notified,
        })
    }

    /// Let alerts already on their way finish, bounded by the send timeout.
    pub async fn drain_notifications(&self) {
        self.notifier.drain(notify::SEND_TIMEOUT).await;
    }
}
