//! Notification system for clusterbulb alerts.
//!
//! This crate provides a fire-and-forget notification system for sending
//! push alerts when the cluster monitor observes something worth a human's
//! attention, such as pull requests opening on the watched repository.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{Notifier, NotifyEvent, NtfyConfig};
//!
//! # async fn run() {
//! let notifier = Notifier::from_config(
//!     NtfyConfig {
//!         server: Some("https://ntfy.sh".to_string()),
//!         topic: Some("my-cluster".to_string()),
//!         ..NtfyConfig::default()
//!     },
//!     false,
//! );
//!
//! notifier.notify(NotifyEvent::PullRequestsOpened {
//!     repository: "clustershed/homelab".to_string(),
//!     titles: vec!["Bump cilium".to_string()],
//!     timestamp: chrono::Utc::now(),
//! });
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`NtfyChannel`] implements ntfy publish requests
//! - [`Notifier`] dispatches events to all enabled channels

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::ntfy::{NtfyChannel, NtfyConfig, SEND_TIMEOUT};
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::NotifyEvent;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Central notification dispatcher.
///
/// The `Notifier` manages multiple notification channels and dispatches
/// events to all enabled channels in a fire-and-forget manner. Sends still
/// running at shutdown are awaited through [`Notifier::drain`].
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
    in_flight: Mutex<JoinSet<()>>,
}

impl Notifier {
    /// Create a notifier from ntfy settings.
    ///
    /// `disabled` is the global kill switch (`NOTIFY_DISABLED`).
    #[must_use]
    pub fn from_config(ntfy: NtfyConfig, disabled: bool) -> Self {
        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        let channel = NtfyChannel::new(ntfy);
        if channel.enabled() {
            info!("ntfy notifications enabled");
            channels.push(Arc::new(channel));
        }

        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        Self::with_channels(channels)
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Send a notification to all enabled channels (fire-and-forget).
    ///
    /// This method spawns async tasks for each channel and returns immediately.
    /// Errors are logged but not propagated to the caller.
    pub fn notify(&self, event: NotifyEvent) {
        if !self.has_channels() {
            debug!("No channels configured, skipping event");
            return;
        }

        let event = Arc::new(event);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        while in_flight.try_join_next().is_some() {}

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let event = Arc::clone(&event);

            in_flight.spawn(async move {
                let channel_name = channel.name();

                if !channel.enabled() {
                    debug!(channel = channel_name, "Channel disabled, skipping");
                    return;
                }

                match channel.send(&event).await {
                    Ok(()) => {
                        debug!(channel = channel_name, "Notification sent");
                    }
                    Err(e) => {
                        error!(
                            channel = channel_name,
                            error = %e,
                            "Failed to send notification"
                        );
                    }
                }
            });
        }
    }

    /// Wait up to `timeout` for sends started by [`Notifier::notify`].
    ///
    /// Returns `false` if some sends were still running and got abandoned.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let mut in_flight = std::mem::take(
            &mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if in_flight.is_empty() {
            return true;
        }

        debug!(pending = in_flight.len(), "Waiting for in-flight notifications");
        let finished = tokio::time::timeout(timeout, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !finished {
            warn!(
                abandoned = in_flight.len(),
                "Notifications still in flight at shutdown"
            );
        }
        finished
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::disabled()
    }
}
