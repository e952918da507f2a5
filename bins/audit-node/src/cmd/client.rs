use std::sync::Arc;
use std::time::Duration;

use ledger_client::{ClientConfig, LedgerClient};
use transport_http::HttpTransport;

use crate::config::{ClientArgs, GetArgs, LogArgs, NodeConfig, RangeArgs};
use crate::error::NodeError;

fn connect(args: &ClientArgs) -> Result<LedgerClient, NodeError> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?.client,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.gateway {
        config.gateway_url = url.clone();
    }

    let transport = HttpTransport::new(&config.gateway_url, Duration::from_millis(config.call_timeout_ms))?;
    tracing::debug!(gateway = %transport.base_url(), contract = %config.contract_id, "client ready");
    Ok(LedgerClient::from_config(Arc::new(transport), &config))
}

pub async fn log(args: LogArgs) -> Result<(), NodeError> {
    let client = connect(&args.client)?;
    if args.wait {
        let block = client
            .log_event_and_wait(&args.device_id, &args.timestamp, &args.payload_hex)
            .await?;
        println!("committed in block {block}");
    } else {
        let tx_id = client
            .log_event(&args.device_id, &args.timestamp, &args.payload_hex)
            .await?;
        println!("{tx_id}");
    }
    Ok(())
}

pub async fn get(args: GetArgs) -> Result<(), NodeError> {
    let client = connect(&args.client)?;
    println!("{}", client.query_event(&args.device_id, &args.timestamp).await?);
    Ok(())
}

pub async fn range(args: RangeArgs) -> Result<(), NodeError> {
    let client = connect(&args.client)?;
    let text = match &args.device {
        Some(device) => client.query_device_by_date_range(&args.start, &args.end, device).await?,
        None => client.query_all_by_date_range(&args.start, &args.end).await?,
    };
    println!("{text}");
    Ok(())
}
