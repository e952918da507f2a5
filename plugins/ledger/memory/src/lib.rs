//! In-process ledger network for development and tests.
//!
//! Hosts contracts, simulates their invocations against committed world
//! state, orders and commits transactions with MVCC validation, answers
//! predicate queries, and publishes committed events.

pub mod config;
pub mod ledger;
pub mod mango;
pub mod simulator;
pub mod world;

pub use config::MemoryLedgerConfig;
pub use ledger::{BroadcastSubscription, Endorsed, MVCC_READ_CONFLICT, MemoryLedger};
pub use simulator::{RwSet, TxSimulator};
pub use world::{Version, WorldState};
