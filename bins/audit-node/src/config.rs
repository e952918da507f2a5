use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use ledger_client::ClientConfig;
use ledger_memory::MemoryLedgerConfig;

use crate::error::NodeError;

#[derive(Parser)]
#[command(name = "audit-node", about = "Device event audit ledger")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an in-memory ledger hosting the event contract behind the gateway
    Serve(ServeArgs),
    /// Record a device event
    Log(LogArgs),
    /// Print one stored event
    Get(GetArgs),
    /// Print events whose timestamp falls in a range
    Range(RangeArgs),
    /// Log a few sample events against an in-process ledger and query them back
    Demo,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "audit-node.toml", env = "AUDIT_CONFIG")]
    pub config: String,
}

#[derive(Args, Clone, Debug)]
pub struct ClientArgs {
    /// TOML config file; only its [client] table is used
    #[arg(long, env = "AUDIT_CONFIG")]
    pub config: Option<String>,

    /// Gateway base URL, overrides the config file
    #[arg(long, env = "AUDIT_GATEWAY")]
    pub gateway: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    pub device_id: String,
    #[arg(allow_hyphen_values = true)]
    pub timestamp: String,
    /// Payload as a hex string
    pub payload_hex: String,

    /// Wait until the event is committed
    #[arg(long)]
    pub wait: bool,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Args, Clone, Debug)]
pub struct GetArgs {
    pub device_id: String,
    #[arg(allow_hyphen_values = true)]
    pub timestamp: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Args, Clone, Debug)]
pub struct RangeArgs {
    /// Inclusive lower bound; unbounded when omitted
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub start: String,

    /// Inclusive upper bound; unbounded when omitted
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub end: String,

    /// Restrict to one device
    #[arg(long)]
    pub device: Option<String>,

    #[command(flatten)]
    pub client: ClientArgs,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub ledger: MemoryLedgerConfig,
    /// `contract_id` here is also the id `serve` deploys the event contract
    /// under, so client commands reading the same file always target it.
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_listen() -> String {
    "127.0.0.1:9300".into()
}

impl NodeConfig {
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|detail| NodeError::Config { context: "parse", detail: format!("'{path}': {detail}") })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}
