use crate::args::Args;
use crate::error::LedgerError;
use crate::state::LedgerState;

/// A contract hosted by a ledger network.
///
/// The network routes each invocation here by function name with the
/// caller's ordered arguments, and runs it against a per-invocation
/// [`LedgerState`]. The returned bytes are the response payload.
pub trait Contract: Send + Sync {
    fn invoke(
        &self,
        ctx: &mut dyn LedgerState,
        function: &str,
        args: &Args,
    ) -> Result<Vec<u8>, LedgerError>;
}
