use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use ledger_api::{Args, EventRecord, LedgerError, RangeEntry, Submitted, Transport, TxStatus};

use crate::config::ClientConfig;
use crate::retry::RetryPolicy;

pub const LOG_EVENT: &str = "LogEvent";
pub const QUERY_EVENT: &str = "QueryEvent";
pub const QUERY_ALL_BY_DATE_RANGE: &str = "QueryAllByDateRange";
pub const QUERY_DEVICE_BY_DATE_RANGE: &str = "QueryDeviceByDateRange";

/// Application-side façade over the event contract.
///
/// Arguments go out as UTF-8 byte strings in call order. `LogEvent` is
/// submitted as a transaction; the queries are evaluated read-only against
/// committed state, so a query issued right after [`log_event`] may not
/// see it yet. Use [`log_event_and_wait`] or [`wait_for_event`] when that
/// matters.
///
/// [`log_event`]: LedgerClient::log_event
/// [`log_event_and_wait`]: LedgerClient::log_event_and_wait
/// [`wait_for_event`]: LedgerClient::wait_for_event
#[derive(Clone)]
pub struct LedgerClient {
    transport: Arc<dyn Transport>,
    contract_id: String,
    call_timeout: Duration,
    commit_timeout: Duration,
    poll_interval: Duration,
    retry: RetryPolicy,
}

impl LedgerClient {
    pub fn new(transport: Arc<dyn Transport>, contract_id: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            transport,
            contract_id: contract_id.into(),
            call_timeout: Duration::from_millis(defaults.call_timeout_ms),
            commit_timeout: Duration::from_millis(defaults.commit_timeout_ms),
            poll_interval: Duration::from_millis(defaults.poll_interval_ms),
            retry: defaults.retry,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            contract_id: config.contract_id.clone(),
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            commit_timeout: Duration::from_millis(config.commit_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            retry: config.retry.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    // ═══════════════════════════════════════════════════════════════
    //  Contract calls
    // ═══════════════════════════════════════════════════════════════

    /// Submit a `LogEvent` transaction and return its transaction id.
    /// The write is not visible until the network commits it.
    pub async fn log_event(&self, device_id: &str, timestamp: &str, payload_hex: &str) -> Result<String, LedgerError> {
        let args = Args::from_strs(&[device_id, timestamp, payload_hex]);
        let submitted = self
            .with_policy(LOG_EVENT, self.call_timeout, move || self.submit(LOG_EVENT, args.clone()))
            .await?;
        tracing::debug!(tx_id = %submitted.tx_id, device = %device_id, timestamp, "event submitted");
        Ok(submitted.tx_id)
    }

    /// Submit a `LogEvent` transaction and wait until it is committed.
    /// Returns the block number.
    pub async fn log_event_and_wait(
        &self,
        device_id: &str,
        timestamp: &str,
        payload_hex: &str,
    ) -> Result<u64, LedgerError> {
        let args = Args::from_strs(&[device_id, timestamp, payload_hex]);
        let budget = self.call_timeout + self.commit_timeout;
        let block = self
            .with_policy(LOG_EVENT, budget, move || {
                let args = args.clone();
                async move {
                    let submitted = self.submit(LOG_EVENT, args).await?;
                    self.wait_for_commit(&submitted.tx_id).await
                }
            })
            .await?;
        tracing::info!(device = %device_id, timestamp, block, "event committed");
        Ok(block)
    }

    /// Fetch one event's stored JSON text.
    pub async fn query_event(&self, device_id: &str, timestamp: &str) -> Result<String, LedgerError> {
        self.evaluate(QUERY_EVENT, Args::from_strs(&[device_id, timestamp])).await
    }

    /// JSON array of every event with `start <= timestamp <= end`. Empty
    /// bounds are unbounded.
    pub async fn query_all_by_date_range(&self, start: &str, end: &str) -> Result<String, LedgerError> {
        self.evaluate(QUERY_ALL_BY_DATE_RANGE, Args::from_strs(&[start, end])).await
    }

    pub async fn query_device_by_date_range(
        &self,
        start: &str,
        end: &str,
        device_id: &str,
    ) -> Result<String, LedgerError> {
        self.evaluate(QUERY_DEVICE_BY_DATE_RANGE, Args::from_strs(&[start, end, device_id]))
            .await
    }

    // ═══════════════════════════════════════════════════════════════
    //  Typed helpers
    // ═══════════════════════════════════════════════════════════════

    pub async fn query_event_record(&self, device_id: &str, timestamp: &str) -> Result<EventRecord, LedgerError> {
        let text = self.query_event(device_id, timestamp).await?;
        EventRecord::from_json(text.as_bytes())
    }

    pub async fn query_all_records(&self, start: &str, end: &str) -> Result<Vec<RangeEntry>, LedgerError> {
        RangeEntry::parse_array(&self.query_all_by_date_range(start, end).await?)
    }

    pub async fn query_device_records(
        &self,
        start: &str,
        end: &str,
        device_id: &str,
    ) -> Result<Vec<RangeEntry>, LedgerError> {
        RangeEntry::parse_array(&self.query_device_by_date_range(start, end, device_id).await?)
    }

    // ═══════════════════════════════════════════════════════════════
    //  Waiting for commit
    // ═══════════════════════════════════════════════════════════════

    /// Poll the commit status of `tx_id` until it leaves `Pending`.
    pub async fn wait_for_commit(&self, tx_id: &str) -> Result<u64, LedgerError> {
        let deadline = Instant::now() + self.commit_timeout;
        loop {
            match self.transport.commit_status(tx_id).await? {
                TxStatus::Committed { block } => return Ok(block),
                TxStatus::Invalidated { reason } => {
                    return Err(LedgerError::ledger_write(format!(
                        "transaction {tx_id} invalidated: {reason}"
                    )));
                }
                TxStatus::Pending => {}
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::communication(format!(
                    "transaction {tx_id} not committed within {:?}",
                    self.commit_timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll `QueryEvent` until some record for (`device_id`, `timestamp`) is
    /// visible. Gives up with the last `NotFound` once the commit timeout
    /// elapses; any other error is returned immediately.
    ///
    /// This does not track a particular write: if the key already holds a
    /// committed record, that record is returned at once even while an
    /// overwrite is still pending. Use [`Self::log_event_and_wait`] to wait
    /// for a specific write.
    pub async fn wait_for_event(&self, device_id: &str, timestamp: &str) -> Result<String, LedgerError> {
        let deadline = Instant::now() + self.commit_timeout;
        loop {
            match self.query_event(device_id, timestamp).await {
                Err(e) if e.kind() == ledger_api::ErrorKind::NotFound && Instant::now() < deadline => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                other => return other,
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Transport plumbing
    // ═══════════════════════════════════════════════════════════════

    async fn submit(&self, function: &str, args: Args) -> Result<Submitted, LedgerError> {
        self.transport
            .submit_transaction(&self.contract_id, function, args)
            .await
    }

    async fn evaluate(&self, function: &str, args: Args) -> Result<String, LedgerError> {
        let bytes = self
            .with_policy(function, self.call_timeout, move || {
                self.transport
                    .evaluate_query(&self.contract_id, function, args.clone())
            })
            .await?;
        String::from_utf8(bytes)
            .map_err(|e| LedgerError::serialization(format!("{function} returned non-UTF-8 payload: {e}")))
    }

    /// Run `call` under the per-call timeout, retrying retryable failures
    /// as the configured policy allows.
    async fn with_policy<T, F, Fut>(&self, function: &str, timeout: Duration, mut call: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(LedgerError::communication(format!(
                    "{function} timed out after {timeout:?}"
                ))),
            };
            match result {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(function, attempt, ?delay, error = %e, "call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
