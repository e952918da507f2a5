use serde::{Deserialize, Serialize};

/// Category of a ledger error. Lets callers tell a bad argument from a
/// commit conflict from a dead network without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload or argument is not valid hex / UTF-8.
    Encoding,
    /// Range bound is not an integer.
    QuerySyntax,
    /// Record could not be serialized or parsed as JSON.
    Serialization,
    /// Composite key attribute contains a reserved code point.
    KeyConstruction,
    /// Point lookup found nothing under the key.
    NotFound,
    /// Put failed or the transaction was invalidated at commit.
    LedgerWrite,
    /// Transport failure or timeout. Retryable.
    LedgerCommunication,
    /// Malformed timestamp, unknown function or wrong arity.
    InvalidArgument,
    /// Invalid configuration. Permanent; fail at startup.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Encoding => f.write_str("encoding"),
            ErrorKind::QuerySyntax => f.write_str("query_syntax"),
            ErrorKind::Serialization => f.write_str("serialization"),
            ErrorKind::KeyConstruction => f.write_str("key_construction"),
            ErrorKind::NotFound => f.write_str("not_found"),
            ErrorKind::LedgerWrite => f.write_str("ledger_write"),
            ErrorKind::LedgerCommunication => f.write_str("ledger_communication"),
            ErrorKind::InvalidArgument => f.write_str("invalid_argument"),
            ErrorKind::Config => f.write_str("config"),
        }
    }
}

/// Unified error for contract, ledger and transport calls.
///
/// Carries an `ErrorKind` and a human-readable message. It serializes as
/// `{"kind": ..., "message": ...}` so a remote error crosses the wire and
/// reaches the client unchanged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerError {
    kind: ErrorKind,
    message: String,
}

impl LedgerError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encoding, msg)
    }

    pub fn query_syntax(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::QuerySyntax, msg)
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, msg)
    }

    pub fn key_construction(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyConstruction, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn ledger_write(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::LedgerWrite, msg)
    }

    pub fn communication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::LedgerCommunication, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Transport failures and commit conflicts may succeed on a later
    /// attempt; everything else is a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::LedgerCommunication | ErrorKind::LedgerWrite)
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl std::fmt::Debug for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LedgerError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → LedgerError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self { Self::serialization(e.to_string()) }
}

impl From<hex::FromHexError> for LedgerError {
    fn from(e: hex::FromHexError) -> Self { Self::encoding(e.to_string()) }
}

impl From<std::str::Utf8Error> for LedgerError {
    fn from(e: std::str::Utf8Error) -> Self { Self::encoding(e.to_string()) }
}

impl From<std::string::FromUtf8Error> for LedgerError {
    fn from(e: std::string::FromUtf8Error) -> Self { Self::encoding(e.to_string()) }
}
