// src/request_manager/errors.rs

use serde_json::Error as SerdeError;
use std::time::Duration;
use thiserror::Error;

use super::id_allocator::RequestId;

/// Every way a pending request (or a submission) can fail.
///
/// The error is `Clone` because a connection teardown hands the same
/// error to every outstanding waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Response with id '{0}' is already pending")]
    DuplicateId(RequestId),

    #[error("Too many pending requests (limit {0})")]
    TooManyPending(usize),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response format error: {0}")]
    ResponseFormat(String),

    #[error("Unrecognized response status: {0}")]
    UnrecognizedStatus(String),

    #[error("Remote error: {message}")]
    Remote { message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response deserialization error: {0}")]
    Deserialization(String),

    #[error("Request serialization error: {0}")]
    Serialization(String),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response channel closed")]
    ResponseChannelClosed,
}

impl RequestError {
    /// Builds the domain rejection for a `status == "error"` envelope,
    /// preferring `errorMessage` over `error`.
    pub fn remote(error_message: Option<&str>, error: Option<&str>) -> Self {
        let message = error_message
            .or(error)
            .unwrap_or("request failed without an error message");
        RequestError::Remote {
            message: message.to_string(),
        }
    }
}

// Custom Result type for request manager operations
pub type Result<T> = std::result::Result<T, RequestError>;

impl From<SerdeError> for RequestError {
    fn from(error: SerdeError) -> Self {
        RequestError::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_prefers_error_message() {
        let err = RequestError::remote(Some("noNetwork"), Some("noCurrent"));
        assert_eq!(
            err,
            RequestError::Remote {
                message: "noNetwork".to_string()
            }
        );
    }

    #[test]
    fn test_remote_falls_back_to_error_field() {
        let err = RequestError::remote(None, Some("actNotFound"));
        assert_eq!(err.to_string(), "Remote error: actNotFound");
    }

    #[test]
    fn test_remote_generic_message() {
        let err = RequestError::remote(None, None);
        assert!(matches!(err, RequestError::Remote { .. }));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let err: RequestError = serde_err.into();
        assert!(matches!(err, RequestError::Serialization(_)));
    }
}
