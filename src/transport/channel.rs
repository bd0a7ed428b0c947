// src/transport/channel.rs

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::Transport;
use crate::request_manager::{RequestError, Result};

/// In-memory transport: requests go into an mpsc channel, responses come
/// back through another one. Used by the demo binary and the tests.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_message(&self, message: String) -> Result<()> {
        self.outbound
            .send(message)
            .map_err(|_| RequestError::Transport("peer is gone".to_string()))
    }
}

/// Inbound messages for the client side. Ends when the remote end drops its
/// response sender, which is how a closed connection looks.
#[derive(Debug)]
pub struct InboundStream {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Stream for InboundStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// The far side of the connection.
#[derive(Debug)]
pub struct RemoteEnd {
    pub requests: mpsc::UnboundedReceiver<String>,
    pub responses: mpsc::UnboundedSender<String>,
}

pub fn channel_transport() -> (ChannelTransport, InboundStream, RemoteEnd) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            outbound: request_tx,
        },
        InboundStream {
            receiver: response_rx,
        },
        RemoteEnd {
            requests: request_rx,
            responses: response_tx,
        },
    )
}
