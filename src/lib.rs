//! # FCM Client
//!
//! A client for the Firebase Cloud Messaging legacy HTTP API and the Instance
//! ID API: sending messages to tokens and topics, managing topic
//! subscriptions and device groups, and importing APNs tokens.
//!
//! Every call is a single JSON request authorized with the server key. The
//! client never retries; failed and partially failed sends are turned into a
//! [`ResponseStatus`], which tells whether a retry may succeed and how long the
//! service asked to wait.
//!
//! # Example
//!
//! ```no_run
//! use fcm_client::*;
//!
//! # async fn run() -> Result<(), FcmError> {
//! let client = FcmClient::new("server-key")?;
//!
//! let mut builder = MessageBuilder::new("registration-token");
//! builder.set_notification(Notification::new("Hi", "You have a new message"));
//!
//! let status = match client.send(builder.build()?).await {
//!     Ok(status) => status,
//!     Err(err) => match err.response_status() {
//!         Some(status) => status,
//!         None => return Err(err),
//!     },
//! };
//!
//! if client.is_retryable(&status) {
//!     let wait = status.retry_after_duration()?;
//!     println!("retry in {:?}", wait);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The HTTP transport is chosen with cargo features: `isahc-client` (default,
//! any executor), `hyper-client` or `hyper-rustls-client` (Tokio). A custom
//! transport implements [`HttpTransport`] and is passed to
//! [`FcmClient::with_transport`].

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub use crate::client::{FcmClient, FcmResponse};
pub use crate::clients::request_builder;
pub use crate::clients::{HttpTransport, MAX_RESPONSE_SIZE};
pub use crate::config::{
    ClientConfig, ClientConfigBuilder, Endpoints, BATCH_ADD_URL, BATCH_IMPORT_URL, BATCH_REMOVE_URL, DEFAULT_TIMEOUT,
    FCM_SEND_URL, INSTANCE_INFO_URL, INSTANCE_RELATIONS_URL, NOTIFICATION_GROUP_URL,
};
pub use crate::error::{ApiError, DeliveryError, ErrorBody, FcmError, RetryAfter};
pub use crate::message::{
    extract_topic_name, topic_target, Message, MessageBuilder, MessageResult, Priority, TopicResponse, MAX_TTL,
    TOPICS_PREFIX,
};
pub use crate::notification::Notification;
pub use crate::response_status::{ResponseStatus, RetryableErrors};
pub use crate::services::groups::{GroupOperation, NotificationGroupRequest, NotificationGroupResponse};
pub use crate::services::instance_id::{
    BatchRequest, BatchResponse, BatchResult, ImportRequest, ImportResponse, ImportResult, InstanceInfo,
    InstanceRelations, SubscribeResponse, TopicRelation,
};

#[cfg(feature = "hyper-client")]
pub use crate::clients::hyper_client::HyperTransport;
#[cfg(feature = "hyper-rustls-client")]
pub use crate::clients::hyper_rustls_client::HyperRustlsTransport;
#[cfg(feature = "isahc-client")]
pub use crate::clients::isahc_client::IsahcTransport;

mod client;
mod clients;
mod config;
mod error;
pub mod fan_out;
mod message;
mod notification;
mod response_status;
mod services;
