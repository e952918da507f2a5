//! Ledger-resident store of device events.
//!
//! Point lookups go through a deterministic composite key ([`key`]); range
//! lookups go through a predicate query over the stored JSON ([`selector`])
//! whose matches are assembled into one JSON array ([`results`]).

pub mod dispatch;
pub mod key;
pub mod results;
pub mod selector;
pub mod store;

pub use dispatch::Function;
pub use store::{EventStore, LOG_EVENT_NAME};
