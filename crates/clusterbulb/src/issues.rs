//! Detected issues and the liveness registry behind them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    Node,
    Pod,
    Event,
    PullRequest,
}

/// A detected unhealthy condition with a stable identity key.
///
/// Issues are snapshot values returned by a single collector invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Issue {
    #[must_use]
    pub fn new(
        key: String,
        issue_type: IssueType,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            issue_type,
            message,
            timestamp,
        }
    }
}

/// Key for a node issue: `node/<name>`.
#[must_use]
pub fn node_key(name: &str) -> String {
    format!("node/{name}")
}

/// Key for a pod issue: `pod/<namespace>/<name>`.
#[must_use]
pub fn pod_key(namespace: &str, name: &str) -> String {
    format!("pod/{namespace}/{name}")
}

/// Key for an event issue: `<namespace>/<object>:<reason>`.
#[must_use]
pub fn event_key(namespace: &str, object: &str, reason: &str) -> String {
    format!("{namespace}/{object}:{reason}")
}

/// Key for a pull request: `pr/<number>`.
#[must_use]
pub fn pull_request_key(number: u64) -> String {
    format!("pr/{number}")
}

/// Mapping from issue key to the time it was last seen unhealthy.
///
/// A key is present if and only if the most recent collection pass that
/// considered it found it unhealthy. Both mutations are idempotent.
#[derive(Debug, Default, Clone)]
pub struct IssueRegistry {
    known: HashMap<String, DateTime<Utc>>,
}

impl IssueRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` alive now. Returns `true` if the key was not already known.
    pub fn report(&mut self, key: &str) -> bool {
        self.report_at(key, Utc::now())
    }

    /// Mark `key` alive as of `at`. Returns `true` if the key was not already known.
    pub fn report_at(&mut self, key: &str, at: DateTime<Utc>) -> bool {
        self.known.insert(key.to_string(), at).is_none()
    }

    /// Mark `key` resolved. Returns `true` if the key was known.
    pub fn clear(&mut self, key: &str) -> bool {
        self.known.remove(key).is_some()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_known(&self, key: &str) -> bool {
        self.known.contains_key(key)
    }

    #[must_use]
    pub fn last_seen(&self, key: &str) -> Option<DateTime<Utc>> {
        self.known.get(key).copied()
    }
}
