use ledger_api::{EventRecord, LedgerError, LedgerState};

use crate::key;
use crate::results::build_result_set;
use crate::selector::build_range_selector;

/// Name of the event emitted for every logged device event.
pub const LOG_EVENT_NAME: &str = "logEvent";

/// Ledger-resident store of device events.
///
/// Holds no state: every call runs against the `LedgerState` it is given
/// and nothing is cached between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventStore;

impl EventStore {
    pub fn new() -> Self {
        Self
    }

    pub fn init_ledger(&self, ctx: &mut dyn LedgerState) -> Result<(), LedgerError> {
        tracing::debug!(tx_id = ctx.tx_id(), "ledger initialised");
        Ok(())
    }

    /// Record an event under its (device, timestamp) key.
    ///
    /// Every validation step runs before the put, so a rejected call leaves
    /// state untouched. The `logEvent` notification carries the decoded
    /// payload bytes; a failure to attach it is logged and does not fail
    /// the write.
    pub fn log_event(
        &self,
        ctx: &mut dyn LedgerState,
        device_id: &str,
        timestamp: &str,
        payload_hex: &str,
    ) -> Result<(), LedgerError> {
        let payload = hex::decode(payload_hex)
            .map_err(|e| LedgerError::encoding(format!("payload is not a valid hex string: {e}")))?;
        let timestamp = parse_timestamp(timestamp)?;

        let record = EventRecord::new(device_id, timestamp, &payload);
        let value = record.to_json().map_err(|e| e.with_context("serialize event"))?;
        let key = key::event_key(device_id, timestamp)?;

        ctx.put_state(&key, value)
            .map_err(|e| LedgerError::ledger_write(format!("put {key:?}: {e}")))?;

        let size = payload.len();
        if let Err(e) = ctx.set_event(LOG_EVENT_NAME, payload) {
            tracing::warn!(device = %device_id, timestamp, error = %e, "failed to attach logEvent");
        }

        tracing::debug!(
            tx_id = ctx.tx_id(),
            device = %device_id,
            timestamp,
            bytes = size,
            "event logged"
        );
        Ok(())
    }

    /// Fetch the stored JSON of one event.
    pub fn query_event(
        &self,
        ctx: &mut dyn LedgerState,
        device_id: &str,
        timestamp: &str,
    ) -> Result<String, LedgerError> {
        let timestamp = parse_timestamp(timestamp)?;
        let key = key::event_key(device_id, timestamp)?;

        let bytes = ctx
            .get_state(&key)
            .map_err(|e| e.with_context("failed to read"))?
            .ok_or_else(|| {
                LedgerError::not_found(format!("event {device_id}@{timestamp} does not exist"))
            })?;

        String::from_utf8(bytes)
            .map_err(|e| LedgerError::serialization(format!("stored event is not UTF-8: {e}")))
    }

    /// All events with `start <= timestamp <= end`; empty bounds are open.
    pub fn query_all_by_date_range(
        &self,
        ctx: &mut dyn LedgerState,
        start: &str,
        end: &str,
    ) -> Result<String, LedgerError> {
        self.query_range(ctx, start, end, None)
    }

    /// Events of one device with `start <= timestamp <= end`.
    pub fn query_device_by_date_range(
        &self,
        ctx: &mut dyn LedgerState,
        start: &str,
        end: &str,
        device_id: &str,
    ) -> Result<String, LedgerError> {
        self.query_range(ctx, start, end, Some(device_id))
    }

    fn query_range(
        &self,
        ctx: &mut dyn LedgerState,
        start: &str,
        end: &str,
        device_id: Option<&str>,
    ) -> Result<String, LedgerError> {
        let query = build_range_selector(start, end, device_id)?.to_json()?;
        tracing::trace!(%query, "range query");
        let results = ctx.get_query_result(&query)?;
        build_result_set(results)
    }
}

fn parse_timestamp(text: &str) -> Result<i64, LedgerError> {
    text.parse::<i64>()
        .map_err(|e| LedgerError::invalid_argument(format!("timestamp '{text}' is not an integer: {e}")))
}
