use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use event_contract::EventStore;
use ledger_gateway::AppState;
use ledger_memory::MemoryLedger;

use crate::config::{NodeConfig, ServeArgs};
use crate::error::NodeError;

pub async fn run(args: ServeArgs) -> Result<(), NodeError> {
    tracing::info!("audit-node starting");

    let config = NodeConfig::load(&args.config)?;
    tracing::info!(config = %args.config, "loaded config");

    let token = CancellationToken::new();

    // --- Ledger + contract ---
    let ledger = Arc::new(MemoryLedger::start(config.ledger.clone()));
    ledger.deploy(&config.client.contract_id, Arc::new(EventStore::new()));

    // --- Gateway (HTTP + WS) ---
    let state = AppState::new(ledger.clone(), ledger.clone());
    let mut api_handle = tokio::spawn(ledger_gateway::run(config.listen.clone(), state, token.clone()));

    tracing::info!(listen = %config.listen, contract = %config.client.contract_id, "node ready");

    tokio::select! {
        res = &mut api_handle => {
            // Gateway ended on its own: bind failure or serve error.
            res??;
            return Ok(());
        }
        sig = tokio::signal::ctrl_c() => sig?,
    }
    tracing::info!("shutting down...");

    token.cancel();

    match tokio::time::timeout(Duration::from_secs(5), &mut api_handle).await {
        Ok(res) => {
            if let Err(e) = res? {
                tracing::error!(error = %e, "gateway error during shutdown");
            }
        }
        Err(_) => {
            tracing::warn!("gateway did not stop within 5s, aborting");
            api_handle.abort();
        }
    }

    tracing::info!(height = ledger.height(), "shutdown complete");
    Ok(())
}
