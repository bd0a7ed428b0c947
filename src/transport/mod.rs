// src/transport/mod.rs
// The connection side of the request manager: sending requests and feeding
// responses back in.

pub mod channel;
pub mod client;

use async_trait::async_trait;

use crate::request_manager::Result;

/// Fire-and-forget sender for serialized requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, message: String) -> Result<()>;
}

pub use channel::{channel_transport, ChannelTransport, InboundStream, RemoteEnd};
pub use client::{Client, ResponsePump};
