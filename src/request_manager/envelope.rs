// src/request_manager/envelope.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{RequestError, Result};
use super::id_allocator::RequestId;

/// Status field of an inbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Error,
    Other(String),
}

impl From<&str> for ResponseStatus {
    fn from(status: &str) -> Self {
        match status {
            "success" => ResponseStatus::Success,
            "error" => ResponseStatus::Error,
            other => ResponseStatus::Other(other.to_string()),
        }
    }
}

/// The part of an inbound message needed to route it. Everything else in the
/// message is ignored.
///
/// Fields stay as raw JSON so an odd `status` or `error` still reaches the
/// request it belongs to instead of sinking the whole message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<Value>,
}

impl InboundEnvelope {
    /// Parses raw inbound text. Only text that is not a JSON object is
    /// malformed at this stage.
    pub fn parse(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| RequestError::MalformedResponse(e.to_string())),
            Ok(other) => Err(RequestError::MalformedResponse(format!(
                "expected a JSON object, got {other}"
            ))),
            Err(e) => Err(RequestError::MalformedResponse(e.to_string())),
        }
    }

    /// Correlation id, or `MalformedResponse` if absent or unusable.
    pub fn request_id(&self) -> Result<RequestId> {
        self.id
            .as_ref()
            .and_then(RequestId::from_json)
            .ok_or_else(|| RequestError::MalformedResponse("valid id not found in response".to_string()))
    }

    /// `None` when absent or null; a non-string status is `Other`.
    pub fn status(&self) -> Option<ResponseStatus> {
        match self.status.as_ref()? {
            Value::Null => None,
            Value::String(status) => Some(ResponseStatus::from(status.as_str())),
            other => Some(ResponseStatus::Other(other.to_string())),
        }
    }

    /// `error` if it is a string.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_ref().and_then(Value::as_str)
    }

    /// `errorMessage` if it is a string.
    pub fn error_message_text(&self) -> Option<&str> {
        self.error_message.as_ref().and_then(Value::as_str)
    }

    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: Some(Value::String(id.into().to_string())),
            status: Some(Value::from("success")),
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn failure(id: impl Into<RequestId>, error: &str, error_message: Option<&str>) -> Self {
        Self {
            id: Some(Value::String(id.into().to_string())),
            status: Some(Value::from("error")),
            error: Some(Value::from(error)),
            error_message: error_message.map(Value::from),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_response() {
        let envelope = InboundEnvelope::parse(
            r#"{"id":"A","status":"success","type":"response","result":{"amount":"100"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.request_id().unwrap(), RequestId::from("A"));
        assert_eq!(envelope.status(), Some(ResponseStatus::Success));
        assert_eq!(envelope.result, Some(json!({"amount": "100"})));
    }

    #[test]
    fn test_parse_error_response() {
        let envelope = InboundEnvelope::parse(
            r#"{"id":7,"status":"error","error":"noNetwork","errorMessage":"Not synced"}"#,
        )
        .unwrap();
        assert_eq!(envelope.request_id().unwrap(), RequestId::from("7"));
        assert_eq!(envelope.status(), Some(ResponseStatus::Error));
        assert_eq!(envelope.error_message_text(), Some("Not synced"));
        assert_eq!(envelope.error_text(), Some("noNetwork"));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let envelope = InboundEnvelope::parse(r#"{"status":"success"}"#).unwrap();
        assert!(matches!(
            envelope.request_id(),
            Err(RequestError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            InboundEnvelope::parse("[1,2,3]"),
            Err(RequestError::MalformedResponse(_))
        ));
        assert!(matches!(
            InboundEnvelope::parse("not json"),
            Err(RequestError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unknown_status() {
        let envelope = InboundEnvelope {
            status: Some(json!("queued")),
            ..InboundEnvelope::default()
        };
        assert_eq!(envelope.status(), Some(ResponseStatus::Other("queued".to_string())));
    }

    #[test]
    fn test_odd_field_types_still_parse() {
        let envelope = InboundEnvelope::parse(r#"{"id":"A","status":1,"error":{"code":19}}"#).unwrap();
        assert_eq!(envelope.request_id().unwrap(), RequestId::from("A"));
        assert_eq!(envelope.status(), Some(ResponseStatus::Other("1".to_string())));
        assert_eq!(envelope.error_text(), None);
    }

    #[test]
    fn test_null_status_counts_as_missing() {
        let envelope = InboundEnvelope::parse(r#"{"id":"A","status":null}"#).unwrap();
        assert_eq!(envelope.status(), None);
    }
}
