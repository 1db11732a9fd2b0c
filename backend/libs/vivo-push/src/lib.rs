//! vivo Push Client Library
//!
//! This library provides a client for the vivo push gateway, used to deliver
//! notifications to Android devices running vivo's system push service.
//!
//! It handles:
//! - Signed authentication with application credentials
//! - Token caching with single-flight refresh
//! - Bounded retry with backoff on network failure
//! - Single-device, list (save-then-push) and broadcast delivery
//! - Delivery statistics queries
//!
//! # Example
//!
//! ```rust,no_run
//! use vivo_push::{MessageBuilder, VivoClient, VivoPushConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vivo_push::VivoError> {
//!     let client = VivoClient::connect(VivoPushConfig::from_env()?).await?;
//!
//!     let payload = MessageBuilder::new("Sale", "50% off today").build_payload()?;
//!     let reg_ids = vec!["reg-a".to_string(), "reg-b".to_string()];
//!     let result = client.send_list(&payload, &reg_ids).await?;
//!
//!     let status = client
//!         .get_message_status_by_job_key(result.task_id.as_deref().unwrap_or_default())
//!         .await?;
//!     println!("{:?}", status.statistics);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod message;
pub mod models;
pub mod retry;
pub mod session;
pub mod transport;

pub use client::VivoClient;
pub use config::{Credentials, VivoPushConfig};
pub use errors::{Result, TransportError, VivoError};
pub use message::{Classification, Message, MessageBuilder, MessagePayload, NetworkType, NotifyType};
pub use models::{BatchStatusResult, InvalidUser, ResultEnvelope, SendResult, TaskData};
pub use retry::RetryConfig;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
