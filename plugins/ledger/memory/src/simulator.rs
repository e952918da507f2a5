use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ledger_api::{KeyValue, LedgerError, LedgerState, QueryResults, StateQueryIterator};

use crate::mango::Selector;
use crate::world::{Version, WorldState};

/// Everything a simulated transaction did, checked and applied at commit.
#[derive(Debug, Default, Clone)]
pub struct RwSet {
    /// Keys read with the version seen (`None` = absent).
    pub reads: BTreeMap<String, Option<Version>>,
    pub writes: BTreeMap<String, Vec<u8>>,
    pub event: Option<(String, Vec<u8>)>,
}

/// Executes one invocation against a committed snapshot.
///
/// Reads see committed state only, never the transaction's own writes.
/// Predicate query matches are not added to the read set, so they are not
/// re-validated at commit.
pub struct TxSimulator<'w> {
    tx_id: String,
    world: &'w WorldState,
    rwset: RwSet,
    open_cursors: Arc<AtomicUsize>,
}

impl<'w> TxSimulator<'w> {
    pub fn new(tx_id: String, world: &'w WorldState, open_cursors: Arc<AtomicUsize>) -> Self {
        Self {
            tx_id,
            world,
            rwset: RwSet::default(),
            open_cursors,
        }
    }

    pub fn into_rwset(self) -> RwSet {
        self.rwset
    }
}

impl LedgerState for TxSimulator<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let entry = self.world.get(key);
        self.rwset.reads.insert(key.to_string(), entry.map(|e| e.version));
        Ok(entry.map(|e| e.value.clone()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::invalid_argument("key must not be empty"));
        }
        self.rwset.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn get_query_result(&mut self, query: &str) -> Result<QueryResults<'_>, LedgerError> {
        let selector = Selector::parse(query)?;
        let matches: Vec<KeyValue> = self
            .world
            .iter()
            .filter(|(_, entry)| {
                // Non-JSON values are invisible to predicate queries.
                serde_json::from_slice::<serde_json::Value>(&entry.value)
                    .map(|doc| selector.matches(&doc))
                    .unwrap_or(false)
            })
            .map(|(key, entry)| KeyValue { key: key.clone(), value: entry.value.clone() })
            .collect();

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(QueryResults::new(Box::new(MemoryCursor {
            items: matches.into_iter(),
            open_cursors: self.open_cursors.clone(),
        })))
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        if name.is_empty() {
            return Err(LedgerError::invalid_argument("event name must not be empty"));
        }
        self.rwset.event = Some((name.to_string(), payload));
        Ok(())
    }
}

struct MemoryCursor {
    items: std::vec::IntoIter<KeyValue>,
    open_cursors: Arc<AtomicUsize>,
}

impl StateQueryIterator for MemoryCursor {
    fn next_result(&mut self) -> Option<Result<KeyValue, LedgerError>> {
        self.items.next().map(Ok)
    }

    fn close(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
