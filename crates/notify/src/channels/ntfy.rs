//! ntfy push notification channel.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Lowest priority ntfy accepts.
pub const MIN_PRIORITY: u8 = 1;

/// Highest priority ntfy accepts.
pub const MAX_PRIORITY: u8 = 5;

/// Priority used when none is configured.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Transport timeout for one publish request.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination and presentation settings for ntfy.
#[derive(Debug, Clone)]
pub struct NtfyConfig {
    /// Server base URL, e.g. `https://ntfy.sh`. Unset disables the channel.
    pub server: Option<String>,
    /// Topic to publish to. Required once a server is set.
    pub topic: Option<String>,
    /// Message priority, 1 (min) to 5 (max).
    pub priority: u8,
    /// Tags rendered as emoji/labels by ntfy clients.
    pub tags: Vec<String>,
    /// Title override; the event title is used when unset.
    pub title: Option<String>,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            server: None,
            topic: None,
            priority: DEFAULT_PRIORITY,
            tags: vec![],
            title: None,
        }
    }
}

/// ntfy notification channel.
pub struct NtfyChannel {
    config: NtfyConfig,
    client: reqwest::Client,
}

impl NtfyChannel {
    /// Create an ntfy channel with the given settings.
    #[must_use]
    pub fn new(config: NtfyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();

        if config.server.is_some() {
            debug!("ntfy notifications enabled");
        } else {
            debug!("ntfy notifications disabled (NTFY_SERVER not set)");
        }

        Self { config, client }
    }

    fn publish_url(server: &str, topic: &str) -> String {
        format!("{}/{}", server.trim_end_matches('/'), topic)
    }
}

#[async_trait]
impl NotifyChannel for NtfyChannel {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    fn enabled(&self) -> bool {
        self.config.server.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let Some(server) = self.config.server.as_deref() else {
            return Ok(());
        };

        let topic = self
            .config
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("NTFY_TOPIC".to_string()))?;

        let priority = self.config.priority;
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(ChannelError::InvalidPriority(priority));
        }

        let title = self.config.title.clone().unwrap_or_else(|| event.title());

        debug!(channel = "ntfy", topic = %topic, title = %title, "Sending notification");

        let mut request = self
            .client
            .post(Self::publish_url(server, topic))
            .header("Title", title)
            .header("Priority", priority.to_string())
            .body(event.body());

        if !self.config.tags.is_empty() {
            request = request.header("Tags", self.config.tags.join(","));
        }

        let response = request.send().await?;

        if response.status().is_success() {
            debug!(channel = "ntfy", "Notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "ntfy",
                status = %status,
                body = %body,
                "ntfy publish request failed"
            );

            Err(ChannelError::Rejected {
                service: "ntfy",
                status: status.as_u16(),
                body,
            })
        }
    }
}
