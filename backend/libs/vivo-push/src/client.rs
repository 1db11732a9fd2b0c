use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{
    VivoPushConfig, MESSAGE_STATUS_PATH, PUSH_TO_ALL_PATH, PUSH_TO_LIST_PATH,
    SAVE_LIST_PAYLOAD_PATH, SEND_PATH,
};
use crate::errors::{Result, TransportError, VivoError};
use crate::message::{Message, MessagePayload};
use crate::models::{BatchStatusResult, ListMessage, ResultEnvelope, SendResult, TaskData};
use crate::retry::with_retry;
use crate::session::SessionManager;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

pub const MIN_LIST_TARGETS: usize = 2;
pub const MAX_LIST_TARGETS: usize = 1000;

/// vivo push gateway client
///
/// Every POST attaches a valid auth token (refreshing it when needed) and is
/// retried on network failure; GETs reuse the cached token and are sent once.
pub struct VivoClient {
    config: VivoPushConfig,
    session: SessionManager,
    transport: Arc<dyn HttpTransport>,
}

impl VivoClient {
    /// Create a client backed by a pooled reqwest transport
    pub fn new(config: VivoPushConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: VivoPushConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let session = SessionManager::new(&config, transport.clone());
        Self {
            config,
            session,
            transport,
        }
    }

    /// Create a client and authenticate immediately, so bad credentials fail fast
    pub async fn connect(config: VivoPushConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.get_token().await?;
        Ok(client)
    }

    pub fn config(&self) -> &VivoPushConfig {
        &self.config
    }

    /// Current auth token, refreshed from the gateway when expired
    pub async fn get_token(&self) -> Result<String> {
        self.session.get_token().await
    }

    /// Send `message` to a single device.
    ///
    /// The envelope is returned as-is; callers inspect its result code.
    pub async fn send(&self, message: &Message, reg_id: &str) -> Result<SendResult> {
        let message = message.with_target(reg_id);
        let body = self.post(SEND_PATH, serde_json::to_vec(&message)?).await?;
        let result: SendResult = serde_json::from_str(&body)?;

        debug!(
            "Single send request_id={} code={}",
            message.header.request_id, result.envelope.code
        );
        Ok(result)
    }

    /// Save list-push content; the returned envelope carries its task id
    pub async fn save_list_payload(&self, payload: &MessagePayload) -> Result<SendResult> {
        let body = self
            .post(SAVE_LIST_PAYLOAD_PATH, serde_json::to_vec(payload)?)
            .await?;
        let result: SendResult = serde_json::from_str(&body)?;
        ensure_success("saveListPayload", body, result)
    }

    /// Push `payload` to 2..=1000 devices.
    ///
    /// The payload is saved first; a failed save ends the operation without
    /// pushing. A rejected push returns [`VivoError::Application`] with the
    /// envelope (and task id) attached.
    pub async fn send_list(&self, payload: &MessagePayload, reg_ids: &[String]) -> Result<SendResult> {
        if !(MIN_LIST_TARGETS..=MAX_LIST_TARGETS).contains(&reg_ids.len()) {
            return Err(VivoError::Validation(format!(
                "regIds must contain between {} and {} entries, got {}",
                MIN_LIST_TARGETS,
                MAX_LIST_TARGETS,
                reg_ids.len()
            )));
        }

        let saved = self.save_list_payload(payload).await?;
        let task_id = saved.task_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            VivoError::Decode(serde::de::Error::custom(
                "saveListPayload succeeded without a taskId",
            ))
        })?;

        let list = ListMessage::new(reg_ids.to_vec(), task_id.clone());
        let body = self
            .post(PUSH_TO_LIST_PATH, serde_json::to_vec(&list)?)
            .await?;
        let mut result: SendResult = serde_json::from_str(&body)?;
        if result.task_id.is_none() {
            result.task_id = Some(task_id);
        }

        let result = ensure_success("pushToList", body, result)?;
        info!(
            "List push accepted task_id={:?} request_id={} targets={}",
            result.task_id,
            list.request_id,
            reg_ids.len()
        );
        Ok(result)
    }

    /// Push `payload` to every subscribed device
    pub async fn send_all(&self, payload: &MessagePayload) -> Result<SendResult> {
        let body = self
            .post(PUSH_TO_ALL_PATH, serde_json::to_vec(payload)?)
            .await?;
        let result: SendResult = serde_json::from_str(&body)?;

        let result = ensure_success("pushToAll", body, result)?;
        info!(
            "Broadcast accepted task_id={:?} request_id={}",
            result.task_id, payload.header.request_id
        );
        Ok(result)
    }

    /// Delivery statistics for previously submitted jobs.
    ///
    /// Decoding is best-effort: entries that fail to parse are dropped and
    /// reported through [`VivoError::PartialStatus`], which keeps the rest.
    pub async fn get_message_status(&self, job_keys: &[&str]) -> Result<BatchStatusResult> {
        if job_keys.is_empty() {
            return Err(VivoError::Validation(
                "at least one job key is required".to_string(),
            ));
        }

        let url = Url::parse_with_params(
            &self.config.url(MESSAGE_STATUS_PATH),
            &[("taskIds", job_keys.join(","))],
        )
        .map_err(|e| VivoError::Config(format!("Invalid status URL: {}", e)))?;

        let body = self.get(url.as_str()).await?;
        decode_status(&body)
    }

    pub async fn get_message_status_by_job_key(&self, job_key: &str) -> Result<BatchStatusResult> {
        self.get_message_status(&[job_key]).await
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> Result<String> {
        let token = self.session.get_token().await?;
        let request = HttpRequest::post(self.config.url(path), body).with_auth_token(token);

        let response = with_retry(
            &self.config.retry,
            TransportError::is_retryable,
            || self.transport.execute(request.clone()),
        )
        .await?;
        response.into_success_body()
    }

    async fn get(&self, url: &str) -> Result<String> {
        let mut request = HttpRequest::get(url);
        if let Some(token) = self.session.cached_token().await {
            request = request.with_auth_token(token);
        }

        self.transport.execute(request).await?.into_success_body()
    }
}

fn ensure_success(operation: &str, body: String, result: SendResult) -> Result<SendResult> {
    if result.envelope.is_success() {
        return Ok(result);
    }

    warn!(
        "{} rejected: code={} desc={}",
        operation, result.envelope.code, result.envelope.description
    );
    Err(VivoError::Application {
        code: result.envelope.code,
        body,
        result: Some(Box::new(result)),
    })
}

fn decode_status(body: &str) -> Result<BatchStatusResult> {
    let raw: serde_json::Value = serde_json::from_str(body)?;

    let mut failed = 0;
    let mut reason = None;

    let envelope = ResultEnvelope::deserialize(&raw).unwrap_or_else(|e| {
        failed += 1;
        reason = Some(e.to_string());
        ResultEnvelope::default()
    });

    let mut statistics = Vec::new();
    match raw.get("statistics") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Array(entries)) => {
            for entry in entries {
                match TaskData::deserialize(entry) {
                    Ok(data) => statistics.push(data),
                    Err(e) => {
                        failed += 1;
                        reason.get_or_insert_with(|| e.to_string());
                    }
                }
            }
        }
        Some(_) => {
            failed += 1;
            reason.get_or_insert_with(|| "statistics is not an array".to_string());
        }
    }

    if !envelope.is_success() {
        warn!(
            "Status query returned code={} desc={}",
            envelope.code, envelope.description
        );
    }

    let result = BatchStatusResult {
        envelope,
        statistics,
    };
    match reason {
        Some(reason) => Err(VivoError::PartialStatus {
            result: Box::new(result),
            failed,
            reason,
        }),
        None => Ok(result),
    }
}
