use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use ledger_api::{
    Args, ChaincodeEvent, Contract, EventSource, EventSubscription, LedgerError, Submitted,
    Transport, TxStatus,
};

use crate::config::MemoryLedgerConfig;
use crate::simulator::{RwSet, TxSimulator};
use crate::world::WorldState;

/// Reason recorded when a stale read invalidates a transaction.
pub const MVCC_READ_CONFLICT: &str = "MVCC_READ_CONFLICT";

/// A simulated transaction waiting to be ordered and committed.
#[derive(Debug, Clone)]
pub struct Endorsed {
    pub tx_id: String,
    pub payload: Vec<u8>,
    pub rwset: RwSet,
}

struct Pending {
    endorsed: Endorsed,
    submitted_at: Instant,
}

/// Transaction statuses. Finished entries are remembered in completion
/// order and evicted oldest-first once more than `retention` are held.
struct StatusTable {
    statuses: HashMap<String, TxStatus>,
    finished: VecDeque<String>,
    retention: usize,
}

impl StatusTable {
    fn new(retention: usize) -> Self {
        Self { statuses: HashMap::new(), finished: VecDeque::new(), retention }
    }

    fn get(&self, tx_id: &str) -> Option<&TxStatus> {
        self.statuses.get(tx_id)
    }

    fn set(&mut self, tx_id: &str, status: TxStatus) {
        let finished = status != TxStatus::Pending;
        self.statuses.insert(tx_id.to_string(), status);
        if !finished {
            return;
        }
        self.finished.push_back(tx_id.to_string());
        while self.finished.len() > self.retention {
            if let Some(evicted) = self.finished.pop_front() {
                self.statuses.remove(&evicted);
            }
        }
    }
}

struct Inner {
    contracts: RwLock<HashMap<String, Arc<dyn Contract>>>,
    world: RwLock<WorldState>,
    statuses: Mutex<StatusTable>,
    events: broadcast::Sender<ChaincodeEvent>,
    open_cursors: Arc<AtomicUsize>,
    nonce: AtomicU64,
    commit_delay: Duration,
}

/// In-process ledger network.
///
/// Transactions are simulated against committed state, queued to a single
/// FIFO orderer and committed one per block after `commit_delay_ms`.
/// Commit validates every read version (optimistic concurrency); a stale
/// read invalidates the transaction without applying its writes. Queries
/// only ever see committed state, so a read issued right after a submit
/// may miss it.
pub struct MemoryLedger {
    inner: Arc<Inner>,
    orderer: mpsc::UnboundedSender<Pending>,
}

impl MemoryLedger {
    /// Create the ledger and spawn its orderer. Must be called inside a
    /// tokio runtime. The orderer stops when the ledger is dropped.
    pub fn start(config: MemoryLedgerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let inner = Arc::new(Inner {
            contracts: RwLock::new(HashMap::new()),
            world: RwLock::new(WorldState::default()),
            statuses: Mutex::new(StatusTable::new(config.status_retention)),
            events,
            open_cursors: Arc::new(AtomicUsize::new(0)),
            nonce: AtomicU64::new(0),
            commit_delay: Duration::from_millis(config.commit_delay_ms),
        });
        let (orderer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_orderer(inner.clone(), rx));
        tracing::info!(commit_delay_ms = config.commit_delay_ms, "memory ledger started");
        Self { inner, orderer }
    }

    /// Install `contract` under `contract_id`, replacing any previous one.
    pub fn deploy(&self, contract_id: &str, contract: Arc<dyn Contract>) {
        let mut guard = match self.inner.contracts.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("contract registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.insert(contract_id.to_string(), contract);
        tracing::info!(contract = %contract_id, "contract deployed");
    }

    /// Simulate an invocation and return its read/write set without
    /// committing anything.
    pub fn endorse(&self, contract_id: &str, function: &str, args: &Args) -> Result<Endorsed, LedgerError> {
        let contract = self.contract(contract_id)?;
        let tx_id = self.next_tx_id(contract_id, function, args);

        let world = self.inner.read_world();
        let mut sim = TxSimulator::new(tx_id.clone(), &world, self.inner.open_cursors.clone());
        let payload = contract.invoke(&mut sim, function, args)?;
        let rwset = sim.into_rwset();

        Ok(Endorsed { tx_id, payload, rwset })
    }

    /// Validate and apply an endorsed transaction immediately.
    pub fn commit(&self, endorsed: Endorsed) -> TxStatus {
        self.inner.commit(endorsed)
    }

    /// Endorse, then hand the transaction to the orderer. Returns before
    /// the transaction is committed.
    pub fn submit(&self, contract_id: &str, function: &str, args: &Args) -> Result<Submitted, LedgerError> {
        let endorsed = self.endorse(contract_id, function, args)?;
        let submitted = Submitted { tx_id: endorsed.tx_id.clone(), payload: endorsed.payload.clone() };

        self.inner.set_status(&submitted.tx_id, TxStatus::Pending);
        self.orderer
            .send(Pending { endorsed, submitted_at: Instant::now() })
            .map_err(|_| LedgerError::communication("orderer is not running"))?;

        tracing::debug!(tx_id = %submitted.tx_id, contract = %contract_id, function, "transaction submitted");
        Ok(submitted)
    }

    /// Run a read-only invocation against committed state; writes are
    /// discarded.
    pub fn evaluate(&self, contract_id: &str, function: &str, args: &Args) -> Result<Vec<u8>, LedgerError> {
        self.endorse(contract_id, function, args).map(|e| e.payload)
    }

    /// Current status of `tx_id`. Unknown once it has been evicted from the
    /// retained window of finished transactions.
    pub fn status(&self, tx_id: &str) -> Result<TxStatus, LedgerError> {
        self.inner
            .lock_statuses()
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(format!("transaction '{tx_id}' is unknown")))
    }

    /// Number of committed blocks.
    pub fn height(&self) -> u64 {
        self.inner.read_world().height()
    }

    /// Predicate query cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::SeqCst)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChaincodeEvent> {
        self.inner.events.subscribe()
    }

    fn contract(&self, contract_id: &str) -> Result<Arc<dyn Contract>, LedgerError> {
        let guard = match self.inner.contracts.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("contract registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard
            .get(contract_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(format!("contract '{contract_id}' is not deployed")))
    }

    fn next_tx_id(&self, contract_id: &str, function: &str, args: &Args) -> String {
        let nonce = self.inner.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(nonce.to_be_bytes());
        hasher.update(contract_id.as_bytes());
        hasher.update([0]);
        hasher.update(function.as_bytes());
        for arg in args.as_slice() {
            hasher.update((arg.len() as u64).to_be_bytes());
            hasher.update(arg);
        }
        hex::encode(hasher.finalize())
    }
}

impl Inner {
    fn read_world(&self) -> RwLockReadGuard<'_, WorldState> {
        match self.world.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("world state read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_world(&self) -> RwLockWriteGuard<'_, WorldState> {
        match self.world.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("world state write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_statuses(&self) -> std::sync::MutexGuard<'_, StatusTable> {
        match self.statuses.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_status(&self, tx_id: &str, status: TxStatus) {
        self.lock_statuses().set(tx_id, status);
    }

    fn commit(&self, endorsed: Endorsed) -> TxStatus {
        let Endorsed { tx_id, rwset, .. } = endorsed;
        let mut world = self.write_world();

        let stale = rwset
            .reads
            .iter()
            .find(|(key, seen)| world.version(key) != **seen)
            .map(|(key, _)| key.clone());

        let status = match stale {
            Some(key) => {
                let block = world.skip_block();
                tracing::warn!(%tx_id, block, key = ?key, "transaction invalidated: stale read");
                TxStatus::Invalidated { reason: MVCC_READ_CONFLICT.to_string() }
            }
            None => {
                let writes = rwset.writes.len();
                let block = world.apply_block(rwset.writes);
                tracing::debug!(%tx_id, block, writes, "transaction committed");
                if let Some((name, payload)) = rwset.event {
                    let event = ChaincodeEvent { tx_id: tx_id.clone(), block, name, payload };
                    if self.events.send(event).is_err() {
                        tracing::trace!(%tx_id, "no event listeners");
                    }
                }
                TxStatus::Committed { block }
            }
        };
        drop(world);

        self.set_status(&tx_id, status.clone());
        status
    }
}

async fn run_orderer(inner: Arc<Inner>, mut rx: mpsc::UnboundedReceiver<Pending>) {
    while let Some(pending) = rx.recv().await {
        tokio::time::sleep_until(pending.submitted_at + inner.commit_delay).await;
        inner.commit(pending.endorsed);
    }
    tracing::debug!("orderer stopped");
}

// ═══════════════════════════════════════════════════════════════
//  Transport / EventSource
// ═══════════════════════════════════════════════════════════════

impl Transport for MemoryLedger {
    fn submit_transaction(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Submitted, LedgerError>> + Send + '_>> {
        let result = self.submit(contract_id, function, &args);
        Box::pin(async move { result })
    }

    fn evaluate_query(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, LedgerError>> + Send + '_>> {
        let result = self.evaluate(contract_id, function, &args);
        Box::pin(async move { result })
    }

    fn commit_status(
        &self,
        tx_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<TxStatus, LedgerError>> + Send + '_>> {
        let result = self.status(tx_id);
        Box::pin(async move { result })
    }
}

/// Committed-event listener backed by the ledger's broadcast channel.
pub struct BroadcastSubscription {
    rx: broadcast::Receiver<ChaincodeEvent>,
}

impl EventSubscription for BroadcastSubscription {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<ChaincodeEvent>> + Send + '_>> {
        Box::pin(async move {
            loop {
                match self.rx.recv().await {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "event listener lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl EventSource for MemoryLedger {
    fn subscribe(&self) -> Box<dyn EventSubscription> {
        Box::new(BroadcastSubscription { rx: self.subscribe_events() })
    }
}
