use std::str::FromStr;

use ledger_api::{Args, Contract, LedgerError, LedgerState};

use crate::store::EventStore;

/// Functions the event contract exposes to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    InitLedger,
    LogEvent,
    QueryEvent,
    QueryAllByDateRange,
    QueryDeviceByDateRange,
}

impl Function {
    pub const ALL: [Function; 5] = [
        Function::InitLedger,
        Function::LogEvent,
        Function::QueryEvent,
        Function::QueryAllByDateRange,
        Function::QueryDeviceByDateRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::InitLedger => "InitLedger",
            Function::LogEvent => "LogEvent",
            Function::QueryEvent => "QueryEvent",
            Function::QueryAllByDateRange => "QueryAllByDateRange",
            Function::QueryDeviceByDateRange => "QueryDeviceByDateRange",
        }
    }

    /// Number of string arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::InitLedger => 0,
            Function::LogEvent => 3,
            Function::QueryEvent => 2,
            Function::QueryAllByDateRange => 2,
            Function::QueryDeviceByDateRange => 3,
        }
    }

    /// Read-only functions are evaluated as queries; the rest must be
    /// submitted as transactions for their writes to take effect.
    pub fn is_read_only(self) -> bool {
        !matches!(self, Function::InitLedger | Function::LogEvent)
    }
}

impl FromStr for Function {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| LedgerError::invalid_argument(format!("unknown function '{s}'")))
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Contract for EventStore {
    fn invoke(
        &self,
        ctx: &mut dyn LedgerState,
        function: &str,
        args: &Args,
    ) -> Result<Vec<u8>, LedgerError> {
        let function: Function = function.parse()?;
        if args.len() != function.arity() {
            return Err(LedgerError::invalid_argument(format!(
                "{function} expects {} arguments, got {}",
                function.arity(),
                args.len()
            )));
        }
        let a = args.to_strings().map_err(|e| e.with_context(function))?;

        match function {
            Function::InitLedger => self.init_ledger(ctx).map(|()| Vec::new()),
            Function::LogEvent => self.log_event(ctx, &a[0], &a[1], &a[2]).map(|()| Vec::new()),
            Function::QueryEvent => self.query_event(ctx, &a[0], &a[1]).map(String::into_bytes),
            Function::QueryAllByDateRange => {
                self.query_all_by_date_range(ctx, &a[0], &a[1]).map(String::into_bytes)
            }
            Function::QueryDeviceByDateRange => self
                .query_device_by_date_range(ctx, &a[0], &a[1], &a[2])
                .map(String::into_bytes),
        }
    }
}
