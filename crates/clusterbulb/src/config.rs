//! Command line and environment configuration.
//!
//! Every option can be given as a flag or through its environment variable.
//! Malformed or out-of-range numbers are rejected by clap before startup.

use clap::Parser;
use notify::channels::ntfy::DEFAULT_PRIORITY;
use notify::NtfyConfig;
use std::path::PathBuf;
use std::time::Duration;

use crate::collectors::EventSettings;
use crate::github::{GitHubConfig, DEFAULT_API_URL};
use crate::light::LightConfig;
use crate::scheduler::Cadence;

/// Cluster health monitor that drives a smart bulb
#[derive(Debug, Clone, Parser)]
#[command(name = "clusterbulb")]
#[command(about = "Cluster health monitor that drives a smart bulb")]
#[command(version)]
pub struct Config {
    /// Home Assistant base URL (e.g. http://homeassistant.local:8123)
    #[arg(long, env = "HA_URL")]
    pub ha_url: Option<String>,

    /// Home Assistant long-lived access token
    #[arg(long, env = "HA_TOKEN", hide_env_values = true)]
    pub ha_token: Option<String>,

    /// Light entity to drive (e.g. light.cluster_bulb)
    #[arg(long, env = "HA_LIGHT_ENTITY_ID")]
    pub ha_light_entity_id: Option<String>,

    /// Light brightness, 1-255
    #[arg(
        long,
        env = "HA_LIGHT_BRIGHTNESS",
        default_value_t = 255,
        value_parser = clap::value_parser!(u8).range(1..=255)
    )]
    pub ha_light_brightness: u8,

    /// Repository owner (user or organization)
    #[arg(long, env = "GH_OWNER")]
    pub gh_owner: Option<String>,

    /// Repository name
    #[arg(long, env = "GH_REPO")]
    pub gh_repo: Option<String>,

    /// Token for authenticated API requests (raises rate limits)
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    pub gh_token: Option<String>,

    /// Seconds between pull request checks
    #[arg(
        long,
        env = "GH_PR_CHECK_INTERVAL",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub gh_pr_check_interval: u64,

    /// GitHub API base URL
    #[arg(long, env = "GH_API_URL", default_value = DEFAULT_API_URL)]
    pub gh_api_url: String,

    /// Failed pull request checks tolerated before exiting
    #[arg(
        long,
        env = "GH_ERROR_BUDGET",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub gh_error_budget: u32,

    /// ntfy server URL; notifications are off when unset
    #[arg(long, env = "NTFY_SERVER")]
    pub ntfy_server: Option<String>,

    /// ntfy topic
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    /// ntfy priority, 1-5
    #[arg(
        long,
        env = "NTFY_PRIORITY",
        default_value_t = DEFAULT_PRIORITY,
        value_parser = clap::value_parser!(u8).range(1..=5)
    )]
    pub ntfy_priority: u8,

    /// Comma separated ntfy tags
    #[arg(long, env = "NTFY_TAGS", value_delimiter = ',')]
    pub ntfy_tags: Vec<String>,

    /// Notification title
    #[arg(long, env = "NTFY_TITLE", default_value = "Open pull requests")]
    pub ntfy_title: String,

    /// Disable all notifications
    #[arg(long, env = "NOTIFY_DISABLED")]
    pub notify_disabled: bool,

    /// Seconds between light updates
    #[arg(
        long,
        env = "EMIT_INTERVAL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub emit_interval: u64,

    /// Seconds between cluster checks
    #[arg(
        long,
        env = "COLLECT_INTERVAL",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub collect_interval: u64,

    /// Only warning events seen within this many seconds are considered
    #[arg(
        long,
        env = "EVENT_LOOKBACK",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub event_lookback: u64,

    /// Seconds a repeated event key is suppressed within one pass
    #[arg(long, env = "EVENT_DEDUP_WINDOW", default_value_t = 300)]
    pub event_dedup_window: u64,

    /// Append each health report as a JSON line to this file
    #[arg(long, env = "REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

impl Config {
    /// Light settings, or `None` when any of URL, token or entity is missing.
    #[must_use]
    pub fn light(&self) -> Option<LightConfig> {
        Some(LightConfig {
            url: non_empty(self.ha_url.as_ref())?,
            token: non_empty(self.ha_token.as_ref())?,
            entity_id: non_empty(self.ha_light_entity_id.as_ref())?,
            brightness: self.ha_light_brightness,
        })
    }

    /// Repository settings, or `None` when owner or name is missing.
    #[must_use]
    pub fn github(&self) -> Option<GitHubConfig> {
        Some(GitHubConfig {
            api_url: self.gh_api_url.clone(),
            owner: non_empty(self.gh_owner.as_ref())?,
            repo: non_empty(self.gh_repo.as_ref())?,
            token: non_empty(self.gh_token.as_ref()),
        })
    }

    #[must_use]
    pub fn ntfy(&self) -> NtfyConfig {
        NtfyConfig {
            server: non_empty(self.ntfy_server.as_ref()),
            topic: non_empty(self.ntfy_topic.as_ref()),
            priority: self.ntfy_priority,
            tags: self
                .ntfy_tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            title: Some(self.ntfy_title.clone()).filter(|t| !t.is_empty()),
        }
    }

    #[must_use]
    pub fn cadence(&self) -> Cadence {
        Cadence {
            emit: Duration::from_secs(self.emit_interval),
            collect: Duration::from_secs(self.collect_interval),
            pull_requests: Duration::from_secs(self.gh_pr_check_interval),
        }
    }

    #[must_use]
    pub fn event_settings(&self) -> EventSettings {
        EventSettings {
            lookback: chrono::Duration::seconds(self.event_lookback as i64),
            dedup_window: chrono::Duration::seconds(self.event_dedup_window as i64),
        }
    }
}
