use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Credentials, VivoPushConfig, AUTH_PATH};
use crate::errors::{Result, TransportError, VivoError};
use crate::models::{AuthSession, AuthTokenRequest, TokenResult};
use crate::retry::{with_retry, RetryConfig};
use crate::transport::{HttpRequest, HttpTransport};

/// Owns the cached authentication token.
///
/// The cache lock is held for the whole refresh, so concurrent callers that
/// find the token expired wait for a single authentication request and then
/// reuse its result.
pub struct SessionManager {
    credentials: Credentials,
    auth_url: String,
    token_ttl: Duration,
    retry: RetryConfig,
    transport: Arc<dyn HttpTransport>,
    cache: Mutex<Option<AuthSession>>,
}

impl SessionManager {
    pub fn new(config: &VivoPushConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials: config.credentials.clone(),
            auth_url: config.url(AUTH_PATH),
            token_ttl: config.token_ttl,
            retry: config.retry.clone(),
            transport,
            cache: Mutex::new(None),
        }
    }

    /// Valid token, refreshed from the gateway when missing or expired
    pub async fn get_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        let now = Utc::now().timestamp_millis();
        if let Some(session) = cache.as_ref() {
            if session.is_valid_at(now) {
                debug!("Using cached auth token (valid until {})", session.valid_until);
                return Ok(session.token.clone());
            }
        }

        let session = self.authenticate(now).await?;
        let token = session.token.clone();
        *cache = Some(session);
        Ok(token)
    }

    /// Whatever token is cached, expired or not, without refreshing
    pub async fn cached_token(&self) -> Option<String> {
        self.cache
            .lock()
            .await
            .as_ref()
            .map(|session| session.token.clone())
    }

    async fn authenticate(&self, timestamp: i64) -> Result<AuthSession> {
        let request = AuthTokenRequest {
            app_id: self.credentials.app_id().to_string(),
            app_key: self.credentials.app_key().to_string(),
            timestamp,
            sign: self.credentials.sign(timestamp),
        };
        let request = HttpRequest::post(&self.auth_url, serde_json::to_vec(&request)?);

        let response = with_retry(
            &self.retry,
            TransportError::is_retryable,
            || self.transport.execute(request.clone()),
        )
        .await?;
        let body = response.into_success_body()?;

        let result: TokenResult = serde_json::from_str(&body)?;
        if !result.envelope.is_success() {
            warn!(
                "Authentication rejected: code={} desc={}",
                result.envelope.code, result.envelope.description
            );
            return Err(VivoError::Application {
                code: result.envelope.code,
                body,
                result: None,
            });
        }
        if result.auth_token.is_empty() {
            return Err(VivoError::Decode(serde::de::Error::custom(
                "authentication succeeded without an authToken",
            )));
        }

        let valid_until = timestamp.saturating_add(self.token_ttl.as_millis() as i64);
        info!(
            "Refreshed auth token for app {} (valid until {})",
            self.credentials.app_id(),
            valid_until
        );

        Ok(AuthSession {
            token: result.auth_token,
            valid_until,
        })
    }
}
