//! Cluster health monitor that drives a smart bulb.
//!
//! Node readiness, pod readiness and warning events are collected every few
//! seconds into an [`IssueRegistry`](issues::IssueRegistry). Together with
//! the "pull requests open" flag from the watched repository they derive a
//! [`ClusterState`](state::ClusterState), which the
//! [`ColorEmitter`](emitter::ColorEmitter) turns into a light color once a
//! second:
//!
//! - green: healthy
//! - blue: pull requests open
//! - red: issues detected
//! - blinking red/blue: both
//!
//! The [`Monitor`](scheduler::Monitor) owns the timers and the shared state.

pub mod budget;
pub mod collectors;
pub mod config;
pub mod emitter;
pub mod error;
pub mod github;
pub mod issues;
pub mod k8s;
pub mod light;
pub mod privilege;
pub mod pulls;
pub mod report;
pub mod scheduler;
pub mod state;

pub use error::MonitorError;
pub use scheduler::{Cadence, Monitor};
pub use state::{ClusterState, HealthReport, SharedState};
