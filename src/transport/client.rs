// src/transport/client.rs

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::Transport;
use crate::request_manager::{
    CompletionHandle, OutgoingMessage, Request, RequestError, RequestManager, Result,
};

/// A request manager bound to one transport.
pub struct Client<T: Transport> {
    manager: Arc<RequestManager>,
    transport: T,
    default_timeout: Duration,
    errors: Option<mpsc::UnboundedSender<RequestError>>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, manager: RequestManager, default_timeout: Duration) -> Self {
        Self {
            manager: Arc::new(manager),
            transport,
            default_timeout,
            errors: None,
        }
    }

    /// Where malformed inbound messages get reported, since they cannot be
    /// routed to any caller.
    pub fn with_error_channel(mut self, errors: mpsc::UnboundedSender<RequestError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn manager(&self) -> &Arc<RequestManager> {
        &self.manager
    }

    pub async fn request<R: Request>(&self, request: R) -> Result<R::Response> {
        self.request_with_timeout(request, self.default_timeout).await
    }

    pub async fn request_with_timeout<R: Request>(
        &self,
        request: R,
        timeout: Duration,
    ) -> Result<R::Response> {
        let (message, handle) = self.manager.submit(request, timeout)?;
        self.send_and_wait(message, handle).await
    }

    pub async fn request_json(&self, body: Map<String, Value>) -> Result<Value> {
        let (message, handle) = self.manager.submit_json(body, self.default_timeout)?;
        self.send_and_wait(message, handle).await
    }

    async fn send_and_wait<U>(&self, message: OutgoingMessage, handle: CompletionHandle<U>) -> Result<U> {
        let OutgoingMessage { id, text } = message;
        if let Err(e) = self.transport.send_message(text).await {
            warn!(id = %id, error = %e, "Failed to send request");
            self.manager.reject(&id, e);
        }
        handle.await
    }

    /// Builds the task that feeds inbound messages into this client.
    pub fn pump(&self) -> ResponsePump {
        ResponsePump {
            manager: self.manager.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Reads inbound messages until the connection closes.
pub struct ResponsePump {
    manager: Arc<RequestManager>,
    errors: Option<mpsc::UnboundedSender<RequestError>>,
}

impl ResponsePump {
    /// Dispatches every message from `inbound`; when the stream ends every
    /// request still pending is rejected with `ConnectionClosed`.
    pub async fn run<S>(self, inbound: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut inbound = inbound;
        info!("Response pump started");

        while let Some(message) = inbound.next().await {
            if let Err(e) = self.manager.dispatch_message(&message) {
                error!(error = %e, "Dropping unroutable inbound message");
                if let Some(errors) = &self.errors {
                    let _ = errors.send(e);
                }
            }
        }

        self.manager.reject_all(RequestError::ConnectionClosed(
            "inbound stream ended".to_string(),
        ));
        info!("Response pump stopped");
    }
}
