//! Request/response correlation for message-oriented connections.
//!
//! A [`RequestManager`](request_manager::RequestManager) assigns each outgoing
//! request an id, keeps a pending record until the matching response, an
//! error, a timeout or a connection teardown settles it, and deserializes the
//! response into the type the caller asked for. The [`transport`] module binds
//! a manager to an actual connection.

pub mod config;
pub mod env;
pub mod models;
pub mod request_manager;
pub mod transport;

pub use request_manager::{
    CompletionHandle, Correlated, DispatchOutcome, RequestError, RequestId, RequestManager,
    Request, Result,
};
