// src/request_manager/manager.rs

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::type_name;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::completion::{completion_pair, CompletionHandle};
use super::dispatcher::{self, DispatchOutcome};
use super::envelope::InboundEnvelope;
use super::errors::{RequestError, Result};
use super::id_allocator::{IdAllocator, RequestId};
use super::pending::{PendingRequest, PendingTable, Settlement};
use super::request::{Correlated, Request};
use super::timeout::TimeoutScheduler;

/// Serialized request ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub id: RequestId,
    pub text: String,
}

/// Ties requests sent over one connection to the responses that come back.
///
/// One manager per connection. `submit` registers a request and hands back
/// the serialized message plus a [`CompletionHandle`]; the transport feeds
/// every inbound message to `dispatch_message` and calls `reject_all` when
/// the connection goes away. Submitting arms a tokio timer, so it must run
/// inside a tokio runtime.
pub struct RequestManager {
    table: Arc<PendingTable>,
    allocator: IdAllocator,
    scheduler: TimeoutScheduler,
    max_pending: usize,
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestManager {
    pub fn new() -> Self {
        Self {
            table: Arc::new(PendingTable::new()),
            allocator: IdAllocator::default(),
            scheduler: TimeoutScheduler::new(),
            max_pending: 0,
        }
    }

    pub fn with_allocator(mut self, allocator: IdAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Caps the number of outstanding requests; 0 means unbounded.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Submits a typed request; the completion resolves to `R::Response`.
    pub fn submit<R: Request>(
        &self,
        request: R,
        timeout: Duration,
    ) -> Result<(OutgoingMessage, CompletionHandle<R::Response>)> {
        let command = request.command().to_string();
        self.register::<R::Response, R>(request, timeout, &command)
    }

    /// Submits any correlated body, deserializing the eventual result into `T`.
    pub fn submit_as<T, B>(&self, body: B, timeout: Duration) -> Result<(OutgoingMessage, CompletionHandle<T>)>
    where
        T: DeserializeOwned + Send + 'static,
        B: Correlated,
    {
        self.register::<T, B>(body, timeout, type_name::<B>())
    }

    /// Submits an untyped JSON-object request. Its `"id"` key, if present,
    /// is the correlation id; the completion resolves to the raw `result`.
    pub fn submit_json(
        &self,
        body: Map<String, Value>,
        timeout: Duration,
    ) -> Result<(OutgoingMessage, CompletionHandle<Value>)> {
        let command = body
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or("json")
            .to_string();
        self.register::<Value, _>(body, timeout, &command)
    }

    fn register<T, B>(
        &self,
        mut body: B,
        timeout: Duration,
        command: &str,
    ) -> Result<(OutgoingMessage, CompletionHandle<T>)>
    where
        T: DeserializeOwned + Send + 'static,
        B: Correlated,
    {
        let supplied = body.id();
        loop {
            let id = match &supplied {
                Some(id) => id.clone(),
                None => self.allocator.allocate(|candidate| self.table.contains(candidate)),
            };
            body.set_id(id.clone());
            let text = serde_json::to_string(&body)?;

            let (completion, handle) = completion_pair::<T>(id.clone());
            let table = Arc::downgrade(&self.table);
            let inserted = self.table.insert_with(id.clone(), self.max_pending, || {
                let timer = self
                    .scheduler
                    .arm(id.clone(), timeout, move |id| on_timeout(&table, &id, timeout));
                PendingRequest::new(id.clone(), type_name::<T>(), completion, Some(timer))
            });

            match inserted {
                Ok(()) => {
                    debug!(id = %id, command, timeout = ?timeout, "Request submitted");
                    return Ok((OutgoingMessage { id, text }, handle));
                }
                // A generated id can only collide with a caller-supplied one
                // that raced in; draw again.
                Err(RequestError::DuplicateId(_)) if supplied.is_none() => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Routes a parsed envelope. Errs only when it carries no usable id.
    pub fn dispatch(&self, envelope: InboundEnvelope) -> Result<DispatchOutcome> {
        dispatcher::dispatch(&self.table, envelope)
    }

    /// Parses and routes raw inbound text.
    pub fn dispatch_message(&self, text: &str) -> Result<DispatchOutcome> {
        let envelope = InboundEnvelope::parse(text)?;
        self.dispatch(envelope)
    }

    /// Rejects one pending request, e.g. after its send failed.
    pub fn reject(&self, id: &RequestId, error: RequestError) -> Settlement {
        self.table.reject(id, error)
    }

    pub fn cancel(&self, id: &RequestId) -> Settlement {
        self.table.reject(id, RequestError::Cancelled)
    }

    /// Rejects every request pending at call time with `error` and returns
    /// how many were settled by this call.
    #[instrument(skip(self))]
    pub fn reject_all(&self, error: RequestError) -> usize {
        let ids = self.table.keys();
        let settled = ids
            .iter()
            .filter(|id| self.table.reject(id, error.clone()).is_settled())
            .count();
        info!(snapshot = ids.len(), settled, "Rejected all pending requests");
        settled
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.table.contains(id)
    }

    pub fn pending_ids(&self) -> Vec<RequestId> {
        self.table.keys()
    }
}

impl Drop for RequestManager {
    fn drop(&mut self) {
        if self.table.len() > 0 {
            self.reject_all(RequestError::ConnectionClosed(
                "request manager dropped".to_string(),
            ));
        }
    }
}

fn on_timeout(table: &Weak<PendingTable>, id: &RequestId, timeout: Duration) {
    if let Some(table) = table.upgrade() {
        table.expire(id, timeout);
    }
}
