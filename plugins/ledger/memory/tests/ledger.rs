use std::sync::Arc;
use std::time::Duration;

use ledger_api::{Args, Contract, ErrorKind, EventSource, LedgerError, LedgerState, Transport, TxStatus};
use ledger_memory::{MVCC_READ_CONFLICT, MemoryLedger, MemoryLedgerConfig};

/// Read-modify-write counter: every increment reads the key first, so
/// concurrent increments conflict at commit.
struct Counter;

impl Contract for Counter {
    fn invoke(&self, ctx: &mut dyn LedgerState, function: &str, args: &Args) -> Result<Vec<u8>, LedgerError> {
        let key = args.to_strings()?.remove(0);
        match function {
            "Incr" => {
                let current = match ctx.get_state(&key)? {
                    Some(bytes) => String::from_utf8(bytes)?.parse::<u64>().unwrap_or(0),
                    None => 0,
                };
                let next = (current + 1).to_string();
                ctx.put_state(&key, next.clone().into_bytes())?;
                ctx.set_event("incremented", next.clone().into_bytes())?;
                Ok(next.into_bytes())
            }
            "Get" => ctx
                .get_state(&key)?
                .ok_or_else(|| LedgerError::not_found(format!("{key} not set"))),
            other => Err(LedgerError::invalid_argument(format!("unknown function {other}"))),
        }
    }
}

fn ledger(commit_delay_ms: u64) -> MemoryLedger {
    let ledger = MemoryLedger::start(MemoryLedgerConfig {
        commit_delay_ms,
        event_buffer: 16,
        ..MemoryLedgerConfig::default()
    });
    ledger.deploy("counter", Arc::new(Counter));
    ledger
}

async fn wait_committed(ledger: &MemoryLedger, tx_id: &str) -> TxStatus {
    for _ in 0..200 {
        let status = ledger.status(tx_id).unwrap();
        if status != TxStatus::Pending {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("transaction {tx_id} never left Pending");
}

#[tokio::test]
async fn writes_are_invisible_until_commit() {
    let ledger = ledger(50);
    let submitted = ledger.submit_transaction("counter", "Incr", Args::from_strs(&["hits"])).await.unwrap();
    assert_eq!(submitted.payload, b"1");

    let err = ledger.evaluate_query("counter", "Get", Args::from_strs(&["hits"])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(ledger.commit_status(&submitted.tx_id).await.unwrap(), TxStatus::Pending);

    assert_eq!(wait_committed(&ledger, &submitted.tx_id).await, TxStatus::Committed { block: 1 });
    let value = ledger.evaluate_query("counter", "Get", Args::from_strs(&["hits"])).await.unwrap();
    assert_eq!(value, b"1");
}

#[tokio::test]
async fn stale_read_is_invalidated() {
    let ledger = ledger(0);
    let args = Args::from_strs(&["hits"]);
    let first = ledger.endorse("counter", "Incr", &args).unwrap();
    let second = ledger.endorse("counter", "Incr", &args).unwrap();

    assert_eq!(ledger.commit(first), TxStatus::Committed { block: 1 });
    assert_eq!(
        ledger.commit(second),
        TxStatus::Invalidated { reason: MVCC_READ_CONFLICT.to_string() }
    );
    assert_eq!(ledger.evaluate("counter", "Get", &args).unwrap(), b"1");
    assert_eq!(ledger.height(), 2);
}

#[tokio::test]
async fn events_are_published_on_commit_only() {
    let ledger = ledger(0);
    let mut sub = ledger.subscribe();

    let args = Args::from_strs(&["hits"]);
    let ok = ledger.endorse("counter", "Incr", &args).unwrap();
    let stale = ledger.endorse("counter", "Incr", &args).unwrap();
    ledger.commit(ok.clone());
    ledger.commit(stale);
    let third = ledger.endorse("counter", "Incr", &args).unwrap();
    ledger.commit(third);

    let first = sub.recv().await.unwrap();
    assert_eq!(first.tx_id, ok.tx_id);
    assert_eq!(first.name, "incremented");
    assert_eq!(first.payload, b"1");
    let next = sub.recv().await.unwrap();
    assert_eq!(next.payload, b"2");
    assert_eq!(next.block, 3);
}

#[tokio::test]
async fn contract_errors_surface_verbatim() {
    let ledger = ledger(0);
    let err = ledger.submit_transaction("counter", "Reset", Args::from_strs(&["hits"])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "unknown function Reset");

    let err = ledger.evaluate_query("nope", "Get", Args::from_strs(&["x"])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unknown_transaction_status_is_not_found() {
    let ledger = ledger(0);
    let err = ledger.commit_status("deadbeef").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn orderer_commits_in_submission_order() {
    let ledger = ledger(10);
    let mut ids = Vec::new();
    for key in ["a", "b", "c"] {
        ids.push(ledger.submit("counter", "Incr", &Args::from_strs(&[key])).unwrap().tx_id);
    }
    let mut blocks = Vec::new();
    for id in &ids {
        match wait_committed(&ledger, id).await {
            TxStatus::Committed { block } => blocks.push(block),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(blocks, vec![1, 2, 3]);
}

#[tokio::test]
async fn finished_statuses_are_evicted_oldest_first() {
    let ledger = MemoryLedger::start(MemoryLedgerConfig {
        commit_delay_ms: 60_000,
        status_retention: 2,
        ..MemoryLedgerConfig::default()
    });
    ledger.deploy("counter", Arc::new(Counter));

    let pending = ledger.submit("counter", "Incr", &Args::from_strs(&["queued"])).unwrap().tx_id;

    let mut ids = Vec::new();
    for key in ["a", "b", "c"] {
        let endorsed = ledger.endorse("counter", "Incr", &Args::from_strs(&[key])).unwrap();
        ids.push(endorsed.tx_id.clone());
        ledger.commit(endorsed);
    }

    let err = ledger.status(&ids[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(ledger.status(&ids[1]).unwrap(), TxStatus::Committed { block: 2 });
    assert_eq!(ledger.status(&ids[2]).unwrap(), TxStatus::Committed { block: 3 });
    assert_eq!(ledger.status(&pending).unwrap(), TxStatus::Pending);
}
