//! Notification event types for clusterbulb.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// The watched repository went from no open pull requests to at least one
    PullRequestsOpened {
        /// `owner/repo`
        repository: String,
        /// Titles of the pull requests open at detection time
        titles: Vec<String>,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::PullRequestsOpened { repository, .. } => {
                format!("Open pull requests: {repository}")
            }
        }
    }

    /// Render the message body sent to channels.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::PullRequestsOpened {
                repository, titles, ..
            } => {
                let noun = if titles.len() == 1 {
                    "pull request"
                } else {
                    "pull requests"
                };
                let mut body = format!("{} open {noun} on {repository}", titles.len());
                for title in titles {
                    body.push_str("\n- ");
                    body.push_str(title);
                }
                body
            }
        }
    }
}
