use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::errors::{Result, TransportError, VivoError};

pub const AUTH_TOKEN_HEADER: &str = "authToken";

/// Outbound gateway request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Sent as the `authToken` header when present
    pub auth_token: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            auth_token: None,
            body: Some(body),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            auth_token: None,
            body: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Fully buffered gateway response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Body of a 200 response; any other status becomes [`TransportError::Status`]
    pub fn into_success_body(self) -> Result<String> {
        if self.status == 200 {
            Ok(self.body)
        } else {
            Err(VivoError::Transport(TransportError::Status {
                status: self.status,
                body: self.body,
            }))
        }
    }
}

/// One HTTP exchange with the gateway.
///
/// Only network-level failures are `Err`; every completed round trip,
/// whatever its status, is `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport sharing one connection pool across all calls
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VivoError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http_client
            .request(request.method, request.url.as_str())
            .header("Content-Type", "application/json");
        if let Some(token) = &request.auth_token {
            builder = builder.header(AUTH_TOKEN_HEADER, token);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        // Reading to the end releases the connection back to the pool
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

/// Test transport whose authentication answer arrives only after `auth_delay`,
/// so concurrent callers overlap with an in-flight refresh.
#[cfg(test)]
pub(crate) struct DelayedAuthTransport {
    pub auth_delay: Duration,
    pub auth_calls: std::sync::atomic::AtomicU32,
    pub other_calls: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl DelayedAuthTransport {
    pub fn new(auth_delay: Duration) -> Self {
        Self {
            auth_delay,
            auth_calls: Default::default(),
            other_calls: Default::default(),
        }
    }

    pub fn auth_calls(&self) -> u32 {
        self.auth_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn other_calls(&self) -> u32 {
        self.other_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for DelayedAuthTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        use std::sync::atomic::Ordering;

        if request.url.ends_with(crate::config::AUTH_PATH) {
            let n = self.auth_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.auth_delay).await;
            return Ok(HttpResponse::ok(format!(
                r#"{{"result":0,"desc":"ok","authToken":"tok-{n}"}}"#
            )));
        }

        self.other_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::ok(r#"{"result":0,"desc":"ok"}"#))
    }
}
