use serde::Deserialize;

use ledger_api::LedgerError;

use crate::retry::RetryPolicy;

/// Client configuration, parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Id the event contract is deployed under.
    #[serde(default = "default_contract_id")]
    pub contract_id: String,

    /// Base URL of the ledger gateway (HTTP transport only).
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Upper bound on a single transport call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// How long to wait for commit confirmation or for a record to
    /// become visible.
    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_contract_id() -> String {
    "events".into()
}
fn default_gateway_url() -> String {
    "http://127.0.0.1:9300".into()
}
fn default_call_timeout_ms() -> u64 {
    30_000
}
fn default_commit_timeout_ms() -> u64 {
    10_000
}
fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_id: default_contract_id(),
            gateway_url: default_gateway_url(),
            call_timeout_ms: default_call_timeout_ms(),
            commit_timeout_ms: default_commit_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, LedgerError> {
        toml::from_str(toml_str).map_err(|e| LedgerError::config(e.to_string()))
    }
}
