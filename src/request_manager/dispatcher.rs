// src/request_manager/dispatcher.rs

use serde_json::Value;
use tracing::debug;

use super::envelope::{InboundEnvelope, ResponseStatus};
use super::errors::{RequestError, Result};
use super::id_allocator::RequestId;
use super::pending::{PendingTable, Settlement};

/// What `dispatch` did with an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Resolved(RequestId),
    Rejected(RequestId),
    /// Nothing was waiting for this id (stale, duplicate or unknown).
    Ignored(RequestId),
}

impl DispatchOutcome {
    pub fn id(&self) -> &RequestId {
        match self {
            DispatchOutcome::Resolved(id) | DispatchOutcome::Rejected(id) | DispatchOutcome::Ignored(id) => id,
        }
    }
}

/// Routes one envelope to its pending record. Only an envelope without a
/// usable id is an error; everything else settles at most one request.
pub(crate) fn dispatch(table: &PendingTable, envelope: InboundEnvelope) -> Result<DispatchOutcome> {
    let id = envelope.request_id()?;

    if !table.contains(&id) {
        debug!(id = %id, "No pending request for response, ignoring");
        return Ok(DispatchOutcome::Ignored(id));
    }

    let settlement = match envelope.status() {
        None => table.reject(&id, RequestError::ResponseFormat("missing status".to_string())),
        Some(ResponseStatus::Error) => table.reject(
            &id,
            RequestError::remote(envelope.error_message_text(), envelope.error_text()),
        ),
        Some(ResponseStatus::Other(status)) => {
            table.reject(&id, RequestError::UnrecognizedStatus(status))
        }
        // A success without a result settles with null; the expected type
        // decides whether that is acceptable.
        Some(ResponseStatus::Success) => {
            table.resolve(&id, envelope.result.unwrap_or(Value::Null))
        }
    };

    Ok(match settlement {
        Settlement::Resolved => DispatchOutcome::Resolved(id),
        Settlement::Rejected => DispatchOutcome::Rejected(id),
        Settlement::NotPending => DispatchOutcome::Ignored(id),
    })
}
