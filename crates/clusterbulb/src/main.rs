//! clusterbulb
//!
//! Watches node readiness, pod readiness, warning events and open pull
//! requests, and shows the result on a Home Assistant light:
//! green (healthy), blue (pull requests open), red (issues detected) or
//! blinking red/blue (both). Runs until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clusterbulb::budget::ErrorBudget;
use clusterbulb::config::{Config, LogFormat};
use clusterbulb::emitter::ColorEmitter;
use clusterbulb::github::{GitHubClient, PullRequestSource};
use clusterbulb::k8s::KubeInspector;
use clusterbulb::light::{HomeAssistantLight, Light};
use clusterbulb::privilege::is_superuser;
use clusterbulb::pulls::PullRequestWatcher;
use clusterbulb::report::ReportWriter;
use clusterbulb::state::shared_state;
use clusterbulb::{Monitor, MonitorError};
use notify::Notifier;

const EXIT_SUPERUSER: u8 = 1;
const EXIT_BUDGET_EXHAUSTED: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    if is_superuser() {
        eprintln!("Running with superuser privileges is not permitted.");
        return ExitCode::from(EXIT_SUPERUSER);
    }

    let config = Config::parse();
    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<MonitorError>().is_some() => {
            error!(error = %e, "Giving up");
            ExitCode::from(EXIT_BUDGET_EXHAUSTED)
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Startup failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("clusterbulb=debug,notify=debug,info")
        } else {
            EnvFilter::new("clusterbulb=info,notify=info,warn")
        }
    });

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }
}

async fn run(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting clusterbulb");

    let inspector = KubeInspector::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let light = match config.light() {
        Some(light_config) => {
            let light = HomeAssistantLight::new(light_config)
                .context("Failed to create Home Assistant client")?;
            Some(Arc::new(light) as Arc<dyn Light>)
        }
        None => {
            warn!("HA_URL, HA_TOKEN or HA_LIGHT_ENTITY_ID not set, light updates disabled");
            None
        }
    };

    let source = match config.github() {
        Some(gh_config) => {
            info!(owner = %gh_config.owner, repo = %gh_config.repo, "Watching pull requests");
            let client = GitHubClient::new(gh_config).context("Failed to create GitHub client")?;
            Some(Arc::new(client) as Arc<dyn PullRequestSource>)
        }
        None => {
            info!("GH_OWNER or GH_REPO not set, pull request checks disabled");
            None
        }
    };

    let notifier = Arc::new(Notifier::from_config(config.ntfy(), config.notify_disabled));
    let watcher = PullRequestWatcher::new(
        source,
        notifier,
        ErrorBudget::new("github", config.gh_error_budget),
    );

    let monitor = Monitor::new(
        shared_state(),
        Arc::new(inspector),
        watcher,
        ColorEmitter::new(light),
        config.cadence(),
        config.event_settings(),
    )
    .with_reports(ReportWriter::new(config.report_file.clone()));

    monitor.run(shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
