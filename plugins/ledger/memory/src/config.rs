use serde::Deserialize;

fn default_commit_delay_ms() -> u64 {
    100
}

fn default_event_buffer() -> usize {
    1024
}

fn default_status_retention() -> usize {
    65_536
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryLedgerConfig {
    /// Time between a transaction's submission and its commit. Until then
    /// queries do not see its writes.
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,
    /// Capacity of the committed-event broadcast channel. Slow listeners
    /// beyond it miss events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Finished transaction statuses kept for `commit_status` lookups.
    /// The oldest are forgotten first; pending ones are always kept.
    #[serde(default = "default_status_retention")]
    pub status_retention: usize,
}

impl Default for MemoryLedgerConfig {
    fn default() -> Self {
        Self {
            commit_delay_ms: default_commit_delay_ms(),
            event_buffer: default_event_buffer(),
            status_retention: default_status_retention(),
        }
    }
}
