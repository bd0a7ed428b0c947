// src/request_manager/pending.rs

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::completion::Completion;
use super::errors::{RequestError, Result};
use super::id_allocator::RequestId;
use super::timeout::TimerHandle;

/// What happens to a record once it settles.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Leave the table on the first terminal transition.
    #[default]
    RemoveOnSettle,
}

/// Outcome of one attempt at a terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Resolved,
    Rejected,
    /// Nothing was pending under that id: already settled, never submitted,
    /// or another path won the race.
    NotPending,
}

impl Settlement {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Settlement::NotPending)
    }
}

/// Bookkeeping for one outstanding call.
pub(crate) struct PendingRequest {
    id: RequestId,
    expected_type: &'static str,
    completion: Box<dyn Completion>,
    timer: Option<TimerHandle>,
    removal_policy: RemovalPolicy,
    submitted_at: Instant,
}

impl PendingRequest {
    pub(crate) fn new(
        id: RequestId,
        expected_type: &'static str,
        completion: Box<dyn Completion>,
        timer: Option<TimerHandle>,
    ) -> Self {
        Self {
            id,
            expected_type,
            completion,
            timer,
            removal_policy: RemovalPolicy::default(),
            submitted_at: Instant::now(),
        }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.disarm();
        }
    }

    fn resolve(mut self, payload: Value) -> Settlement {
        self.disarm();
        match self.completion.resolve(payload) {
            Ok(()) => {
                debug!(
                    id = %self.id,
                    expected_type = self.expected_type,
                    policy = ?self.removal_policy,
                    elapsed = ?self.submitted_at.elapsed(),
                    "Request resolved"
                );
                Settlement::Resolved
            }
            Err(e) => {
                warn!(
                    id = %self.id,
                    expected_type = self.expected_type,
                    error = %e,
                    "Response payload did not match the expected type"
                );
                Settlement::Rejected
            }
        }
    }

    fn reject(mut self, error: RequestError) -> Settlement {
        self.disarm();
        debug!(id = %self.id, error = %error, "Request rejected");
        self.completion.reject(error);
        Settlement::Rejected
    }

    /// Timer path: the deadline already fired, so the handle is just released.
    fn expire(mut self, timeout: Duration) -> Settlement {
        drop(self.timer.take());
        warn!(id = %self.id, timeout = ?timeout, "Request timed out");
        self.completion.reject(RequestError::Timeout(timeout));
        Settlement::Rejected
    }
}

/// Concurrent map from id to pending record.
///
/// `remove` is the single arbiter of who settles a request: every terminal
/// path takes the record out first and settles it only if it got one.
#[derive(Default)]
pub(crate) struct PendingTable {
    inner: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, PendingRequest>> {
        // Settlement never panics while holding the lock, so the map is
        // consistent even if some other holder did.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the record built by `build` if `id` is free and the table has
    /// room. `build` runs under the table lock, so a timer armed inside it
    /// cannot fire before the record is visible.
    pub(crate) fn insert_with<F>(&self, id: RequestId, max_pending: usize, build: F) -> Result<()>
    where
        F: FnOnce() -> PendingRequest,
    {
        let mut map = self.lock();
        if map.contains_key(&id) {
            return Err(RequestError::DuplicateId(id));
        }
        if max_pending > 0 && map.len() >= max_pending {
            return Err(RequestError::TooManyPending(max_pending));
        }
        map.insert(id, build());
        Ok(())
    }

    pub(crate) fn contains(&self, id: &RequestId) -> bool {
        self.lock().contains_key(id)
    }

    pub(crate) fn remove(&self, id: &RequestId) -> Option<PendingRequest> {
        self.lock().remove(id)
    }

    pub(crate) fn keys(&self) -> Vec<RequestId> {
        self.lock().keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn resolve(&self, id: &RequestId, payload: Value) -> Settlement {
        match self.remove(id) {
            Some(record) => record.resolve(payload),
            None => Settlement::NotPending,
        }
    }

    pub(crate) fn reject(&self, id: &RequestId, error: RequestError) -> Settlement {
        match self.remove(id) {
            Some(record) => record.reject(error),
            None => Settlement::NotPending,
        }
    }

    pub(crate) fn expire(&self, id: &RequestId, timeout: Duration) -> Settlement {
        match self.remove(id) {
            Some(record) => record.expire(timeout),
            None => Settlement::NotPending,
        }
    }
}
