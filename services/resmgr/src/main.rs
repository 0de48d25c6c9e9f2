//! Resource manager
//!
//! Runs the host drainer against the configured host manager:
//!
//! - **Drainer**: Preempts tasks on draining hosts and confirms empty hosts
//! - **Tracker**: In-memory index of tasks by host
//! - **Preemption queue**: Receives the tasks to evict

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};
use resmgr::config::Config;
use resmgr::hostmgr::HttpHostManager;
use resmgr::preemption::TaskQueue;
use resmgr::task::Tracker;
use resmgr::Drainer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        hostmgr_url = %config.hostmgr_url,
        drainer_period_secs = config.drainer.period.as_secs(),
        draining_hosts_limit = config.drainer.draining_hosts_limit,
        "Starting resource manager"
    );

    let registry = Registry::new();
    let host_mgr = Arc::new(HttpHostManager::new(
        config.hostmgr_url.clone(),
        config.drainer.rpc_timeout,
    )?);
    let tracker = Arc::new(Tracker::new());
    let queue = Arc::new(TaskQueue::with_tracker(Arc::clone(&tracker)));

    let drainer = Drainer::with_config(
        &registry,
        host_mgr,
        config.drainer.clone(),
        tracker,
        queue.clone(),
    );
    drainer.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    drainer.stop()?;
    drainer.wait().await;
    queue.close();

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    info!(metrics = %String::from_utf8_lossy(&buffer), "Final drainer metrics");

    info!("Resource manager shutdown complete");
    Ok(())
}
