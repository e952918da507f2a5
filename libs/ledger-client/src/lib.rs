//! Client façade for the device event contract.

pub mod client;
pub mod config;
pub mod retry;

pub use client::{
    LOG_EVENT, LedgerClient, QUERY_ALL_BY_DATE_RANGE, QUERY_DEVICE_BY_DATE_RANGE, QUERY_EVENT,
};
pub use config::ClientConfig;
pub use retry::RetryPolicy;
