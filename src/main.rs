//! slirc-bot - IRC bot runner
//!
//! Loads a TOML config, starts one client per valid network block and runs
//! until every client stops or the process receives Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use slirc_bot::client::Client;
use slirc_bot::config::BotConfig;
use slirc_bot::event::EventHandler;
use slirc_bot::module;
use slirc_bot::permission::NoPermissions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| BotConfig::default_path().display().to_string());

    let config = BotConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    let (networks, errors) = config.validate();
    for e in &errors {
        error!(error = %e, "skipping network");
    }
    if networks.is_empty() {
        anyhow::bail!("no valid network configured in {}", config_path);
    }

    let registry = module::builtin();
    let permissions = Arc::new(NoPermissions);
    let mut clients = Vec::with_capacity(networks.len());
    for network in networks {
        let handlers: Vec<Arc<dyn EventHandler>> =
            registry.load(&network).into_iter().map(Arc::from).collect();
        info!(
            network = %network.network,
            host = %network.host,
            port = network.port,
            modules = handlers.len(),
            "starting"
        );
        let client = Client::new(network, handlers, permissions.clone());
        client.start();
        clients.push(client);
    }

    let all_stopped = futures_util::future::join_all(clients.iter().map(Client::wait));
    tokio::select! {
        _ = all_stopped => info!("all networks stopped"),
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutting down");
            for client in &clients {
                client.quit(None).await;
            }
        }
    }

    Ok(())
}
