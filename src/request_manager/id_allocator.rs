// src/request_manager/id_allocator.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Correlation token carried by an outgoing request and its response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        RequestId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of an inbound `id` field. Strings are taken verbatim,
    /// integers are stringified; anything else is not a usable id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(RequestId(s.clone())),
            Value::Number(n) if n.is_u64() || n.is_i64() => Some(RequestId(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId(id)
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        RequestId(id.to_string())
    }
}

#[derive(Debug)]
enum Strategy {
    Random,
    Sequential(AtomicU64),
}

/// Hands out ids that are not currently pending.
///
/// One allocator belongs to one connection; uniqueness is only guaranteed
/// against the live pending set, not across the process lifetime.
#[derive(Debug)]
pub struct IdAllocator {
    strategy: Strategy,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::random()
    }
}

impl IdAllocator {
    /// Random v4 UUIDs.
    pub fn random() -> Self {
        Self {
            strategy: Strategy::Random,
        }
    }

    /// Decimal counter starting at `start`. Handy for readable logs.
    pub fn sequential(start: u64) -> Self {
        Self {
            strategy: Strategy::Sequential(AtomicU64::new(start)),
        }
    }

    /// Returns a fresh id for which `is_pending` is false.
    pub fn allocate<F>(&self, is_pending: F) -> RequestId
    where
        F: Fn(&RequestId) -> bool,
    {
        loop {
            let candidate = match &self.strategy {
                Strategy::Random => RequestId::from(Uuid::new_v4()),
                Strategy::Sequential(next) => {
                    RequestId(next.fetch_add(1, Ordering::Relaxed).to_string())
                }
            };
            if !is_pending(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_from_json_accepts_strings_and_integers() {
        assert_eq!(RequestId::from_json(&json!("abc")), Some(RequestId::from("abc")));
        assert_eq!(RequestId::from_json(&json!(42)), Some(RequestId::from("42")));
    }

    #[test]
    fn test_from_json_rejects_other_shapes() {
        assert_eq!(RequestId::from_json(&json!(null)), None);
        assert_eq!(RequestId::from_json(&json!("")), None);
        assert_eq!(RequestId::from_json(&json!(1.5)), None);
        assert_eq!(RequestId::from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let allocator = IdAllocator::random();
        let ids: HashSet<_> = (0..1000).map(|_| allocator.allocate(|_| false)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_skips_pending_ids() {
        let allocator = IdAllocator::sequential(1);
        let pending: HashSet<RequestId> = ["1", "2"].iter().map(|s| RequestId::from(*s)).collect();

        let id = allocator.allocate(|candidate| pending.contains(candidate));
        assert_eq!(id, RequestId::from("3"));
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = RequestId::from("abc");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("abc"));
    }
}
