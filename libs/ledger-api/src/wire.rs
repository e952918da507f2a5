//! JSON bodies exchanged between the HTTP transport and the gateway.
//!
//! Arguments and payloads are arbitrary bytes and travel base64-encoded;
//! event payloads on the WebSocket stream are hex, matching how records
//! store them.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::args::Args;
use crate::error::LedgerError;
use crate::event::ChaincodeEvent;
use crate::transport::Submitted;

fn b64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn b64_decode(text: &str, what: &str) -> Result<Vec<u8>, LedgerError> {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| LedgerError::encoding(format!("{what} is not valid base64: {e}")))
}

/// `POST /api/v1/transactions` and `POST /api/v1/queries` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub contract: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl InvokeRequest {
    pub fn new(contract: &str, function: &str, args: &Args) -> Self {
        Self {
            contract: contract.to_string(),
            function: function.to_string(),
            args: args.as_slice().iter().map(|a| b64_encode(a)).collect(),
        }
    }

    pub fn decode_args(&self) -> Result<Args, LedgerError> {
        self.args
            .iter()
            .enumerate()
            .map(|(i, a)| b64_decode(a, &format!("argument {i}")))
            .collect::<Result<Vec<_>, _>>()
            .map(Args::new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub tx_id: String,
    pub payload: String,
}

impl From<&Submitted> for SubmitResponse {
    fn from(s: &Submitted) -> Self {
        Self { tx_id: s.tx_id.clone(), payload: b64_encode(&s.payload) }
    }
}

impl SubmitResponse {
    pub fn into_submitted(self) -> Result<Submitted, LedgerError> {
        let payload = b64_decode(&self.payload, "payload")?;
        Ok(Submitted { tx_id: self.tx_id, payload })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub payload: String,
}

impl QueryResponse {
    pub fn new(payload: &[u8]) -> Self {
        Self { payload: b64_encode(payload) }
    }

    pub fn decode(&self) -> Result<Vec<u8>, LedgerError> {
        b64_decode(&self.payload, "payload")
    }
}

/// Frame pushed on `GET /ws/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventMessage {
    Event {
        tx_id: String,
        block: u64,
        name: String,
        /// Hex of the event payload.
        payload: String,
    },
}

impl From<&ChaincodeEvent> for EventMessage {
    fn from(e: &ChaincodeEvent) -> Self {
        EventMessage::Event {
            tx_id: e.tx_id.clone(),
            block: e.block,
            name: e.name.clone(),
            payload: hex::encode(&e.payload),
        }
    }
}
