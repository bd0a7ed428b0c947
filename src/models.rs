// src/models.rs
// Typed requests used by the demo binary and the integration tests.
use serde::{Deserialize, Serialize};

use crate::request_manager::{Correlated, Request, RequestId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub command: String,
    pub account: String,
}

impl AccountBalanceRequest {
    pub fn new(account: &str) -> Self {
        Self {
            id: None,
            command: "account_balance".to_string(),
            account: account.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(RequestId::from(id));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: String,
}

impl Correlated for AccountBalanceRequest {
    fn id(&self) -> Option<RequestId> {
        self.id.clone()
    }

    fn set_id(&mut self, id: RequestId) {
        self.id = Some(id);
    }
}

impl Request for AccountBalanceRequest {
    type Response = Balance;

    fn command(&self) -> &str {
        &self.command
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub command: String,
}

impl Default for PingRequest {
    fn default() -> Self {
        Self {
            id: None,
            command: "ping".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {}

impl Correlated for PingRequest {
    fn id(&self) -> Option<RequestId> {
        self.id.clone()
    }

    fn set_id(&mut self, id: RequestId) {
        self.id = Some(id);
    }
}

impl Request for PingRequest {
    type Response = Pong;

    fn command(&self) -> &str {
        &self.command
    }
}
