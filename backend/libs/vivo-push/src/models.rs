use serde::{Deserialize, Serialize};

use crate::message::new_request_id;

/// Gateway result envelope shared by every response.
///
/// `code == 0` is success; anything else is an application-level failure and
/// `description` carries the gateway's reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "result")]
    pub code: i32,
    #[serde(rename = "desc", default)]
    pub description: String,
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Authentication request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenRequest {
    pub app_id: String,
    pub app_key: String,
    pub timestamp: i64,
    pub sign: String,
}

/// Authentication response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResult {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[serde(default)]
    pub auth_token: String,
}

/// Cached authentication token with its validity deadline (unix millis)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub valid_until: i64,
}

impl AuthSession {
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        !self.token.is_empty() && now_millis < self.valid_until
    }
}

/// Target the gateway rejected during a single send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidUser {
    #[serde(default)]
    pub status: i32,
    #[serde(rename = "userid", default)]
    pub user_id: String,
}

/// Response of the send, save-payload, push-to-list and push-to-all endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_user: Option<InvalidUser>,
}

/// List push body binding a saved payload to its recipients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessage {
    pub reg_ids: Vec<String>,
    pub task_id: String,
    pub request_id: String,
}

impl ListMessage {
    /// Bind `task_id` to `reg_ids` under a fresh request id
    pub fn new(reg_ids: Vec<String>, task_id: String) -> Self {
        Self {
            reg_ids,
            task_id,
            request_id: new_request_id(),
        }
    }
}

/// Per-task delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskData {
    pub task_id: String,
    pub target: i64,
    pub send: i64,
    pub receive: i64,
    pub display: i64,
    pub click: i64,
    pub valid: i64,
    #[serde(rename = "targetInActive")]
    pub target_inactive: i64,
    pub target_invalid: i64,
    #[serde(rename = "targetUnSub")]
    pub target_unsubscribe: i64,
    pub target_offline: i64,
    pub controlled: i64,
    pub covered: i64,
}

/// Status endpoint response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatusResult {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[serde(default)]
    pub statistics: Vec<TaskData>,
}
