//! Types and traits shared by the event contract, the ledger backends and
//! the client: errors, the persisted record, invocation arguments, the
//! world-state interface a contract runs against, the transport a client
//! submits through, and the JSON bodies the gateway speaks.

pub mod args;
pub mod contract;
pub mod error;
pub mod event;
pub mod record;
pub mod state;
pub mod transport;
pub mod wire;

pub use args::Args;
pub use contract::Contract;
pub use error::{ErrorKind, LedgerError};
pub use event::{ChaincodeEvent, EventSource, EventSubscription};
pub use record::{EventRecord, RangeEntry};
pub use state::{KeyValue, LedgerState, QueryResults, StateQueryIterator};
pub use transport::{Submitted, Transport, TxStatus};
