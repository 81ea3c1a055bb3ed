use std::fmt;

use serde_json::Value;

use crate::{error::FcmError, notification::Notification};

/// Longest time, in seconds, the service keeps an undelivered message.
pub const MAX_TTL: u32 = 2_419_200;

/// Prefix of a fully qualified topic target, as in `/topics/news`.
pub const TOPICS_PREFIX: &str = "/topics/";

/// Delivery priority of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Normal => "normal",
        };
        f.write_str(s)
    }
}

/// A downstream message.
///
/// `priority` is part of the wire format, but the send operations clear it:
/// the client never forwards a priority and the service default applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// A registration token, notification key or `/topics/<name>`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registration_ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
}

impl Message {
    /// A message addressed to a single registration token or notification key.
    pub fn to(target: impl Into<String>) -> Self {
        Message {
            to: target.into(),
            ..Default::default()
        }
    }

    /// A message addressed to a topic. Accepts a bare name or a qualified
    /// path such as `/topics/news`.
    pub fn to_topic(topic: &str) -> Self {
        Self::to(topic_target(topic))
    }
}

/// The topic name in `topic`.
///
/// A qualified path (a `topics` segment, matched case-insensitively, followed
/// by more segments) yields its last segment; anything else is returned as is.
///
/// ```
/// # use fcm_client::extract_topic_name;
/// assert_eq!("news", extract_topic_name("/topics/news"));
/// assert_eq!("news", extract_topic_name("Topics/chat/news"));
/// assert_eq!("news", extract_topic_name("news"));
/// ```
pub fn extract_topic_name(topic: &str) -> &str {
    let segments: Vec<&str> = topic.split('/').collect();
    let qualified = segments
        .iter()
        .rposition(|segment| segment.eq_ignore_ascii_case("topics"))
        .map_or(false, |pos| pos + 1 < segments.len());

    if qualified {
        segments[segments.len() - 1]
    } else {
        topic
    }
}

/// `/topics/<name>` for a bare or qualified topic.
pub fn topic_target(topic: &str) -> String {
    format!("{}{}", TOPICS_PREFIX, extract_topic_name(topic))
}

/// The outcome for one recipient of a send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResult {
    Failed {
        error: String,
    },
    Delivered {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// A newer token for the device, to replace the one sent to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        registration_id: Option<String>,
    },
}

impl MessageResult {
    pub fn error(&self) -> Option<&str> {
        match self {
            MessageResult::Failed { error } => Some(error),
            MessageResult::Delivered { .. } => None,
        }
    }
}

/// Response to a topic send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicResponse {
    #[serde(default)]
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub multicast_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub success: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failure: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub canonical_ids: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<MessageResult>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl TopicResponse {
    /// The first per-recipient error in the results, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(MessageResult::error)
    }
}

/// The main class for creating a message.
#[derive(Debug)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    /// Creates a builder for a message to `to`, which is either a
    /// registration token, a notification key or a topic path.
    pub fn new(to: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            message: Message::to(to),
        }
    }

    /// Creates a builder for a message to several registration tokens at once.
    pub fn multicast<I, S>(registration_ids: I) -> MessageBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MessageBuilder {
            message: Message {
                registration_ids: registration_ids.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
        }
    }

    pub fn set_notification(&mut self, notification: Notification) {
        self.message.notification = Some(notification);
    }

    /// Custom key/value payload delivered to the app.
    pub fn set_data(&mut self, data: Value) {
        self.message.data = Some(data);
    }

    /// Messages with the same key replace each other while undelivered.
    pub fn set_collapse_key(&mut self, collapse_key: impl Into<String>) {
        self.message.collapse_key = Some(collapse_key.into());
    }

    /// How long, in seconds, the service should keep the message if the
    /// device is offline. At most [`MAX_TTL`].
    pub fn set_ttl(&mut self, ttl: u32) {
        self.message.time_to_live = Some(ttl);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.message.priority = Some(priority);
    }

    pub fn build(self) -> Result<Message, FcmError> {
        let message = self.message;

        if message.to.is_empty() && message.registration_ids.is_empty() {
            return Err(FcmError::InvalidRequest("message has no recipient".into()));
        }

        if let Some(ttl) = message.time_to_live {
            if ttl > MAX_TTL {
                return Err(FcmError::InvalidRequest(format!(
                    "time to live {} exceeds the maximum of {}",
                    ttl, MAX_TTL
                )));
            }
        }

        Ok(message)
    }
}
