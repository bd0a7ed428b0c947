// src/request_manager/mod.rs
// Correlates outgoing requests with the responses that arrive later on the
// same connection.

pub mod errors;
pub mod id_allocator;
pub mod envelope;
pub mod request;
pub mod timeout;

mod completion;
mod dispatcher;
mod manager;
mod pending;

// Re-export specific items to simplify imports elsewhere
pub use completion::CompletionHandle;
pub use dispatcher::DispatchOutcome;
pub use envelope::{InboundEnvelope, ResponseStatus};
pub use errors::{RequestError, Result};
pub use id_allocator::{IdAllocator, RequestId};
pub use manager::{OutgoingMessage, RequestManager};
pub use pending::{RemovalPolicy, Settlement};
pub use request::{Correlated, Request};
pub use timeout::{TimeoutScheduler, TimerHandle};
