use std::sync::Arc;

use event_contract::EventStore;
use ledger_client::LedgerClient;
use ledger_memory::{MemoryLedger, MemoryLedgerConfig};

use crate::error::NodeError;

const SAMPLES: [(&str, &str); 3] = [("faucet", "1234"), ("faucet", "40"), ("fauci", "1234")];

/// Log the sample events on a fresh in-process ledger, wait until they are
/// visible, then print a point lookup and both range queries.
pub async fn run() -> Result<(), NodeError> {
    let ledger = Arc::new(MemoryLedger::start(MemoryLedgerConfig::default()));
    ledger.deploy("events", Arc::new(EventStore::new()));
    let client = LedgerClient::new(ledger.clone(), "events");

    let payload = hex::encode("maiyahee");
    for (device, ts) in SAMPLES {
        let tx_id = client.log_event(device, ts, &payload).await?;
        tracing::info!(device, timestamp = ts, %tx_id, "submitted");
    }
    for (device, ts) in SAMPLES {
        client.wait_for_event(device, ts).await?;
    }

    println!("QueryEvent(faucet, 1234):");
    println!("{}", client.query_event("faucet", "1234").await?);
    println!("QueryDeviceByDateRange(41, 2000, fauci):");
    println!("{}", client.query_device_by_date_range("41", "2000", "fauci").await?);
    println!("QueryAllByDateRange(41, 2000):");
    println!("{}", client.query_all_by_date_range("41", "2000").await?);
    Ok(())
}
