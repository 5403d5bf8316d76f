use anyhow::Context;
use log::{info, warn};

use pcmhal::config::ServiceConfig;
use pcmhal::hal::{drivers, DeviceManager, EndpointQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServiceConfig::load(&path).await?,
        None => {
            warn!("no config file given, using defaults");
            ServiceConfig::default()
        }
    };

    let driver = drivers::select(config.backend)?;

    // Discovery sleeps between attempts while the sound card registers
    let manager = tokio::task::spawn_blocking(move || DeviceManager::init(&config, driver))
        .await
        .context("discovery task panicked")?
        .context("PCM device discovery failed")?;

    if let EndpointQuery::Filled(endpoints) = manager.get_endpoint_info_list(manager.endpoint_count()) {
        for (index, endpoint) in endpoints.iter().enumerate() {
            info!("[{}] {} ({:?})", index, endpoint.name, endpoint.direction);
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down");
    tokio::task::spawn_blocking(move || manager.deinit())
        .await
        .context("teardown task panicked")?;

    Ok(())
}
