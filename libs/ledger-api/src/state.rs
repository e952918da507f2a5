use crate::error::LedgerError;

/// One match produced by a predicate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Cursor over predicate query matches, as handed out by a ledger.
///
/// Lazy, finite and not restartable. `close` releases whatever the
/// ledger holds for the cursor; callers go through [`QueryResults`],
/// which guarantees it is called exactly once.
pub trait StateQueryIterator: Send {
    fn next_result(&mut self) -> Option<Result<KeyValue, LedgerError>>;

    fn close(&mut self);
}

/// Owning wrapper around a ledger cursor.
///
/// The cursor is closed on every exit path: explicitly through
/// [`QueryResults::close`], or on drop when the consumer returns early
/// (including on error via `?`).
pub struct QueryResults<'a> {
    inner: Box<dyn StateQueryIterator + 'a>,
    closed: bool,
}

impl<'a> QueryResults<'a> {
    pub fn new(inner: Box<dyn StateQueryIterator + 'a>) -> Self {
        Self { inner, closed: false }
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.close();
        }
    }
}

impl Iterator for QueryResults<'_> {
    type Item = Result<KeyValue, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.inner.next_result()
    }
}

impl Drop for QueryResults<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// World-state view a contract executes against for one invocation.
///
/// Passed explicitly into every contract call; there is no global stub.
/// Writes and events become visible to other invocations only after the
/// surrounding network commits the transaction.
pub trait LedgerState {
    /// Id of the transaction this invocation belongs to.
    fn tx_id(&self) -> &str;

    /// Point read by exact key. `Ok(None)` when the key was never written.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Execute a predicate query document (`{"selector": {...}}`).
    fn get_query_result(&mut self, query: &str) -> Result<QueryResults<'_>, LedgerError>;

    /// Attach a named event to the transaction. Delivered to listeners
    /// once the transaction commits; at most one per transaction.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting {
        items: Vec<KeyValue>,
        closes: Arc<AtomicUsize>,
    }

    impl StateQueryIterator for Counting {
        fn next_result(&mut self) -> Option<Result<KeyValue, LedgerError>> {
            if self.items.is_empty() {
                None
            } else {
                Some(Ok(self.items.remove(0)))
            }
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn results(n: usize, closes: &Arc<AtomicUsize>) -> QueryResults<'static> {
        let items = (0..n)
            .map(|i| KeyValue { key: format!("k{i}"), value: b"{}".to_vec() })
            .collect();
        QueryResults::new(Box::new(Counting { items, closes: closes.clone() }))
    }

    #[test]
    fn drop_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        {
            let mut r = results(3, &closes);
            assert!(r.next().is_some());
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_close_is_not_repeated_on_drop() {
        let closes = Arc::new(AtomicUsize::new(0));
        let r = results(1, &closes);
        r.close();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn yields_all_then_none() {
        let closes = Arc::new(AtomicUsize::new(0));
        let keys: Vec<String> = results(2, &closes).map(|kv| kv.unwrap().key).collect();
        assert_eq!(keys, vec!["k0", "k1"]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
