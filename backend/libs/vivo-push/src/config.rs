use std::env;
use std::fmt;
use std::time::Duration;

use crate::errors::{Result, VivoError};
use crate::retry::RetryConfig;

pub const PRODUCTION_HOST: &str = "https://api-push.vivo.com.cn";

pub const AUTH_PATH: &str = "/message/auth";
pub const SEND_PATH: &str = "/message/send";
pub const SAVE_LIST_PAYLOAD_PATH: &str = "/message/saveListPayload";
pub const PUSH_TO_LIST_PATH: &str = "/message/pushToList";
pub const PUSH_TO_ALL_PATH: &str = "/message/all";
pub const MESSAGE_STATUS_PATH: &str = "/report/getStatistics";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// The gateway does not report token expiry; tokens are treated as valid for
/// one hour from the signing timestamp.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_POST_ATTEMPTS: u32 = 3;

/// Application credentials issued by the push console
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_key: String,
    app_secret: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Hex MD5 over appId, appKey, timestamp and appSecret, concatenated in that order
    pub fn sign(&self, timestamp_millis: i64) -> String {
        let input = format!(
            "{}{}{}{}",
            self.app_id, self.app_key, timestamp_millis, self.app_secret
        );
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct VivoPushConfig {
    pub credentials: Credentials,
    /// Gateway base URL without trailing slash
    pub host: String,
    /// Overall timeout of a single HTTP exchange
    pub timeout: Duration,
    /// Retry policy for POST requests
    pub retry: RetryConfig,
    pub token_ttl: Duration,
}

impl VivoPushConfig {
    /// Production configuration for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            host: PRODUCTION_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig {
                max_attempts: DEFAULT_POST_ATTEMPTS,
                ..Default::default()
            },
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Load configuration from the environment (and `.env`, if present)
    ///
    /// Required: `VIVO_APP_ID`, `VIVO_APP_KEY`, `VIVO_APP_SECRET`.
    /// Optional: `VIVO_PUSH_HOST`, `VIVO_PUSH_TIMEOUT_SECS`, `VIVO_PUSH_MAX_ATTEMPTS`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let credentials = Credentials::new(
            required("VIVO_APP_ID")?,
            required("VIVO_APP_KEY")?,
            required("VIVO_APP_SECRET")?,
        );

        let mut config = Self::new(credentials);
        if let Ok(host) = env::var("VIVO_PUSH_HOST") {
            config = config.with_host(host);
        }
        if let Some(secs) = parsed::<u64>("VIVO_PUSH_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parsed::<u32>("VIVO_PUSH_MAX_ATTEMPTS")? {
            if attempts == 0 {
                return Err(VivoError::Config(
                    "VIVO_PUSH_MAX_ATTEMPTS must be at least 1".to_string(),
                ));
            }
            config.retry.max_attempts = attempts;
        }
        Ok(config)
    }

    /// Point the client at another gateway, e.g. a test server
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| VivoError::Config(format!("{key} must be set")))
}

fn parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| VivoError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
