use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use tribute_api::app::{build_app, services};
use tribute_infra::config::CleanupConfig;
use tribute_infra::jobs::CleanupScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tribute_observability::init();

    let config = CleanupConfig::from_env().context("invalid configuration")?;
    let jobs = services::build_services(&config).await?;

    let scheduler = if config.scheduler_enabled {
        Some(CleanupScheduler::from_config((*jobs).clone(), &config).spawn())
    } else {
        info!("scheduler disabled; jobs run only on manual trigger");
        None
    };

    let app = build_app(Arc::clone(&jobs));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
