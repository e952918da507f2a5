use std::future::Future;
use std::pin::Pin;

/// A named event attached to a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeEvent {
    pub tx_id: String,
    pub block: u64,
    pub name: String,
    pub payload: Vec<u8>,
}

/// Stream of committed events for one listener.
pub trait EventSubscription: Send {
    /// Next event. None = source closed.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = Option<ChaincodeEvent>> + Send + '_>>;
}

/// Publisher side of the event channel. Delivery is fire-and-forget:
/// events committed while nobody listens are simply not observed.
pub trait EventSource: Send + Sync {
    fn subscribe(&self) -> Box<dyn EventSubscription>;
}
