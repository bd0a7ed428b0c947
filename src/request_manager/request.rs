// src/request_manager/request.rs

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::id_allocator::RequestId;

/// A request body that carries a correlation id.
pub trait Correlated: Serialize {
    /// Id supplied by the caller, if any.
    fn id(&self) -> Option<RequestId>;

    /// Stamps the id that will go out on the wire.
    fn set_id(&mut self, id: RequestId);
}

/// A typed request: the body plus the response type it expects.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct AccountInfo { id: Option<RequestId>, command: &'static str, account: String }
///
/// impl Correlated for AccountInfo { /* id / set_id */ }
///
/// impl Request for AccountInfo {
///     type Response = AccountInfoResult;
///     fn command(&self) -> &str { "account_info" }
/// }
/// ```
pub trait Request: Correlated {
    type Response: DeserializeOwned + Send + 'static;

    /// Name used in logs.
    fn command(&self) -> &str;
}

// Untyped JSON-object requests keep their id under "id".
impl Correlated for Map<String, Value> {
    fn id(&self) -> Option<RequestId> {
        self.get("id").and_then(RequestId::from_json)
    }

    /// Leaves an existing id that already names `id` untouched, so a numeric
    /// id goes out as a number.
    fn set_id(&mut self, id: RequestId) {
        if Correlated::id(self).as_ref() == Some(&id) {
            return;
        }
        self.insert("id".to_string(), Value::String(id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_id_roundtrip() {
        let mut body = Map::new();
        body.insert("command".to_string(), json!("ping"));
        assert_eq!(body.id(), None);

        body.set_id(RequestId::from("p1"));
        assert_eq!(body.id(), Some(RequestId::from("p1")));
        assert_eq!(Value::Object(body)["id"], json!("p1"));
    }

    #[test]
    fn test_map_numeric_id() {
        let mut body = Map::new();
        body.insert("id".to_string(), json!(5));
        assert_eq!(body.id(), Some(RequestId::from("5")));

        body.set_id(RequestId::from("5"));
        assert_eq!(body["id"], json!(5));
    }

    #[test]
    fn test_map_set_id_replaces_a_different_id() {
        let mut body = Map::new();
        body.insert("id".to_string(), json!(5));

        body.set_id(RequestId::from("6"));
        assert_eq!(body["id"], json!("6"));
    }
}
