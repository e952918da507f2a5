use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::args::Args;
use crate::error::LedgerError;

/// Acknowledgement of a submitted transaction.
///
/// Submission is not commit: the payload is what the contract returned
/// during simulation, and the effects are invisible to queries until
/// [`Transport::commit_status`] reports `Committed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub tx_id: String,
    pub payload: Vec<u8>,
}

/// Commit outcome of a transaction, as known to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    /// Accepted for ordering, not yet in a block.
    Pending,
    /// Written in `block`; effects visible to queries.
    Committed { block: u64 },
    /// Rejected at commit (e.g. version conflict); no effects applied.
    Invalidated { reason: String },
}

/// Client-side view of the ledger network.
///
/// All methods block (async) until the network answers. Implementations
/// never retry on their own; a retry policy is layered on top by the
/// caller.
pub trait Transport: Send + Sync {
    /// Submit a state-changing invocation for ordering and commit.
    fn submit_transaction(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Submitted, LedgerError>> + Send + '_>>;

    /// Evaluate a read-only invocation against committed state. Never
    /// ordered, never committed.
    fn evaluate_query(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, LedgerError>> + Send + '_>>;

    /// Look up the commit outcome of a previously submitted transaction.
    /// Unknown ids are a NotFound error.
    fn commit_status(
        &self,
        tx_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<TxStatus, LedgerError>> + Send + '_>>;
}
