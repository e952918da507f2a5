use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// JSON field holding the event timestamp. Range selectors filter on it.
pub const FIELD_TIMESTAMP: &str = "timestamp";
/// JSON field holding the device id. Device selectors filter on it.
pub const FIELD_DEVICE_ID: &str = "id";
/// JSON field holding the hex payload.
pub const FIELD_MESSAGE: &str = "message";

/// A device event as persisted on the ledger.
///
/// Stored as `{"timestamp": <int>, "id": <string>, "message": <hex>}`.
/// `message` is always lower-case hex of the decoded payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: i64,
    #[serde(rename = "id")]
    pub device_id: String,
    pub message: String,
}

impl EventRecord {
    pub fn new(device_id: impl Into<String>, timestamp: i64, payload: &[u8]) -> Self {
        Self {
            timestamp,
            device_id: device_id.into(),
            message: hex::encode(payload),
        }
    }

    /// Decode the stored hex payload back to bytes.
    pub fn payload(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(hex::decode(&self.message)?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, LedgerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One element of a range query response: `{"Key": ..., "Record": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: EventRecord,
}

impl RangeEntry {
    /// Parse a whole range response array.
    pub fn parse_array(text: &str) -> Result<Vec<RangeEntry>, LedgerError> {
        Ok(serde_json::from_str(text)?)
    }
}
