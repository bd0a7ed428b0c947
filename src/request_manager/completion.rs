// src/request_manager/completion.rs

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use super::errors::{RequestError, Result};
use super::id_allocator::RequestId;

/// Type-erased settlement side of a pending request.
///
/// The expected response type is fixed when the request is submitted, so the
/// table can hold completions for many response types side by side.
pub(crate) trait Completion: Send {
    /// Deserializes `payload` into the expected type and settles with it.
    /// A payload that does not fit settles the same completion with a
    /// `Deserialization` error, which is also returned to the caller.
    fn resolve(self: Box<Self>, payload: Value) -> Result<()>;

    fn reject(self: Box<Self>, error: RequestError);
}

struct TypedCompletion<T> {
    sender: oneshot::Sender<Result<T>>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Completion for TypedCompletion<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn resolve(self: Box<Self>, payload: Value) -> Result<()> {
        match serde_json::from_value::<T>(payload) {
            Ok(value) => {
                // The waiter may have dropped its handle; that is not our concern.
                let _ = self.sender.send(Ok(value));
                Ok(())
            }
            Err(e) => {
                let error = RequestError::Deserialization(e.to_string());
                let _ = self.sender.send(Err(error.clone()));
                Err(error)
            }
        }
    }

    fn reject(self: Box<Self>, error: RequestError) {
        let _ = self.sender.send(Err(error));
    }
}

/// Creates the settlement side and the caller-facing handle for one request.
pub(crate) fn completion_pair<T>(id: RequestId) -> (Box<dyn Completion>, CompletionHandle<T>)
where
    T: DeserializeOwned + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let completion = TypedCompletion {
        sender,
        _phantom: PhantomData,
    };
    (Box::new(completion), CompletionHandle { id, receiver })
}

/// Future resolving to the response of one submitted request.
///
/// Dropping the handle does not cancel the request; the pending record still
/// leaves the table through its normal terminal paths.
#[derive(Debug)]
pub struct CompletionHandle<T> {
    id: RequestId,
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> CompletionHandle<T> {
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

impl<T> Future for CompletionHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RequestError::ResponseChannelClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Balance {
        amount: String,
    }

    #[tokio::test]
    async fn test_resolve_deserializes_into_expected_type() {
        let (completion, handle) = completion_pair::<Balance>(RequestId::from("a"));
        assert_eq!(handle.id(), &RequestId::from("a"));

        completion.resolve(json!({"amount": "100"})).unwrap();
        assert_eq!(
            handle.await,
            Ok(Balance {
                amount: "100".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_shape_mismatch_rejects_same_completion() {
        let (completion, handle) = completion_pair::<Balance>(RequestId::from("b"));

        let outcome = completion.resolve(json!({"amount": 100}));
        assert!(matches!(outcome, Err(RequestError::Deserialization(_))));
        assert!(matches!(handle.await, Err(RequestError::Deserialization(_))));
    }

    #[tokio::test]
    async fn test_reject_delivers_error() {
        let (completion, handle) = completion_pair::<Value>(RequestId::from("c"));
        completion.reject(RequestError::Cancelled);
        assert_eq!(handle.await, Err(RequestError::Cancelled));
    }

    #[tokio::test]
    async fn test_dropped_completion_closes_handle() {
        let (completion, handle) = completion_pair::<Value>(RequestId::from("d"));
        drop(completion);
        assert_eq!(handle.await, Err(RequestError::ResponseChannelClosed));
    }

    #[test]
    fn test_settling_into_dropped_handle_is_noop() {
        let (completion, handle) = completion_pair::<Value>(RequestId::from("e"));
        drop(handle);
        assert!(completion.resolve(json!({})).is_ok());
    }
}
