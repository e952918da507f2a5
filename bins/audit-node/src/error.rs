#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Ledger(#[from] ledger_api::LedgerError),

    #[error("gateway: {0}")]
    Gateway(#[from] ledger_gateway::GatewayError),

    #[error("gateway task: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
