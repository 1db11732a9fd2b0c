//! Notification content and its builder
//!
//! A [`MessageBuilder`] is configured with consuming setters and finished with
//! [`MessageBuilder::build_message`] (single-target send) or
//! [`MessageBuilder::build_payload`] (content saved once and referenced by list
//! or broadcast pushes). Protocol limits are checked at build time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, VivoError};

/// Default retention on the gateway: one day
pub const DEFAULT_TIME_TO_LIVE: i64 = 86_400;
pub const MIN_TIME_TO_LIVE: i64 = 60;
pub const MAX_TIME_TO_LIVE: i64 = 7 * 86_400;

pub const MAX_CUSTOM_PAIRS: usize = 10;
pub const MAX_CUSTOM_CHARS: usize = 1024;
pub const MAX_WEB_URL_CHARS: usize = 1000;
pub const MAX_SKIP_CONTENT_CHARS: usize = 1024;

/// Fresh request id: a random UUID, upper-cased
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// How the device alerts the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyType {
    Silent = 1,
    Ring = 2,
    Vibrate = 3,
    RingAndVibrate = 4,
}

/// What happens when the notification is tapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipType {
    LauncherActivity = 1,
    WebUrl = 2,
    Custom = 3,
    Activity = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Any = -1,
    WifiOnly = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Operational = 0,
    System = 1,
}

/// Fields shared by single-target messages and saved payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub title: String,
    pub content: String,
    pub notify_type: i32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub time_to_live: i64,
    pub skip_type: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub skip_content: String,
    #[serde(
        rename = "clientCustomMap",
        default,
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub client_custom_map: HashMap<String, String>,
    #[serde(rename = "extra", default, skip_serializing_if = "HashMap::is_empty")]
    pub advanced_features: HashMap<String, String>,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub network_type: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub classification: i32,
    /// 0 production, 1 test
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub push_mode: i32,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

/// Message addressed to one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten)]
    pub header: MessageHeader,
    #[serde(default)]
    pub reg_id: String,
}

impl Message {
    /// Copy of this message addressed to `reg_id`
    pub fn with_target(&self, reg_id: &str) -> Self {
        Self {
            header: self.header.clone(),
            reg_id: reg_id.to_string(),
        }
    }
}

/// Content saved once and referenced by list or broadcast pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(flatten)]
    pub header: MessageHeader,
}

/// Fluent builder for [`Message`] and [`MessagePayload`]
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    header: MessageHeader,
    request_id: Option<String>,
}

impl MessageBuilder {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            header: MessageHeader {
                title: title.into(),
                content: content.into(),
                notify_type: NotifyType::Ring as i32,
                time_to_live: DEFAULT_TIME_TO_LIVE,
                skip_type: SkipType::LauncherActivity as i32,
                skip_content: String::new(),
                client_custom_map: HashMap::new(),
                advanced_features: HashMap::new(),
                request_id: String::new(),
                network_type: NetworkType::Any as i32,
                classification: Classification::System as i32,
                push_mode: 0,
            },
            request_id: None,
        }
    }

    pub fn notify_type(mut self, notify_type: NotifyType) -> Self {
        self.header.notify_type = notify_type as i32;
        self
    }

    /// Retention on the gateway in seconds
    pub fn time_to_live(mut self, seconds: i64) -> Self {
        self.header.time_to_live = seconds;
        self
    }

    /// Open the app's home screen on tap
    pub fn launcher_activity(mut self) -> Self {
        self.header.skip_type = SkipType::LauncherActivity as i32;
        self.header.skip_content.clear();
        self
    }

    pub fn jump_web_url(self, url: impl Into<String>) -> Self {
        self.skip(SkipType::WebUrl, url.into())
    }

    pub fn jump_custom(self, value: impl Into<String>) -> Self {
        self.skip(SkipType::Custom, value.into())
    }

    /// Open a specific in-app page on tap
    pub fn jump_activity(self, activity: impl Into<String>) -> Self {
        self.skip(SkipType::Activity, activity.into())
    }

    fn skip(mut self, skip_type: SkipType, content: String) -> Self {
        self.header.skip_type = skip_type as i32;
        self.header.skip_content = content;
        self
    }

    /// Key/value pair delivered to the client app
    pub fn custom_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header
            .client_custom_map
            .insert(key.into(), value.into());
        self
    }

    pub fn advanced_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header
            .advanced_features
            .insert(key.into(), value.into());
        self
    }

    /// Delivery receipt callback
    pub fn callback(self, address: impl Into<String>, param: impl Into<String>) -> Self {
        self.advanced_feature("callback", address)
            .advanced_feature("callback.param", param)
    }

    pub fn network_type(mut self, network_type: NetworkType) -> Self {
        self.header.network_type = network_type as i32;
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.header.classification = classification as i32;
        self
    }

    /// Deliver only to the app's registered test devices
    pub fn test_mode(mut self) -> Self {
        self.header.push_mode = 1;
        self
    }

    /// Use a caller-supplied request id instead of a generated one
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn build_message(self) -> Result<Message> {
        Ok(Message {
            header: self.finish()?,
            reg_id: String::new(),
        })
    }

    pub fn build_payload(self) -> Result<MessagePayload> {
        Ok(MessagePayload {
            header: self.finish()?,
        })
    }

    fn finish(self) -> Result<MessageHeader> {
        let mut header = self.header;
        validate_header(&header)?;
        header.request_id = match self.request_id {
            Some(id) if !id.is_empty() => id,
            _ => new_request_id(),
        };
        Ok(header)
    }
}

fn validate_header(header: &MessageHeader) -> Result<()> {
    if !(MIN_TIME_TO_LIVE..=MAX_TIME_TO_LIVE).contains(&header.time_to_live) {
        return Err(VivoError::Validation(format!(
            "timeToLive must be between {} and {} seconds, got {}",
            MIN_TIME_TO_LIVE, MAX_TIME_TO_LIVE, header.time_to_live
        )));
    }

    if header.client_custom_map.len() > MAX_CUSTOM_PAIRS {
        return Err(VivoError::Validation(format!(
            "clientCustomMap allows at most {} pairs, got {}",
            MAX_CUSTOM_PAIRS,
            header.client_custom_map.len()
        )));
    }
    let custom_chars: usize = header
        .client_custom_map
        .iter()
        .map(|(k, v)| k.chars().count() + v.chars().count())
        .sum();
    if custom_chars > MAX_CUSTOM_CHARS {
        return Err(VivoError::Validation(format!(
            "clientCustomMap exceeds {} characters ({})",
            MAX_CUSTOM_CHARS, custom_chars
        )));
    }

    let skip_chars = header.skip_content.chars().count();
    let limit = if header.skip_type == SkipType::WebUrl as i32 {
        MAX_WEB_URL_CHARS
    } else {
        MAX_SKIP_CONTENT_CHARS
    };
    if header.skip_type != SkipType::LauncherActivity as i32 && skip_chars == 0 {
        return Err(VivoError::Validation(format!(
            "skipContent is required for skipType {}",
            header.skip_type
        )));
    }
    if skip_chars > limit {
        return Err(VivoError::Validation(format!(
            "skipContent exceeds {} characters ({})",
            limit, skip_chars
        )));
    }

    Ok(())
}
