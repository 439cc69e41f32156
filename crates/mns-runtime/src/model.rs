//! XML records exchanged with the service.
//!
//! Request records are serialized with [`to_xml`] under the root element the
//! service expects; requests never carry a namespace. Response records are
//! read with [`from_xml`], which ignores the root element name and any
//! namespace attribute, so each record tolerates missing optional fields.

use crate::error::MnsError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

/// Priority the service assigns when none is given
pub const DEFAULT_MESSAGE_PRIORITY: i64 = 8;

/// Serialize a request record under the given root element
pub fn to_xml<T: Serialize>(root: &str, value: &T) -> Result<String, MnsError> {
    quick_xml::se::to_string_with_root(root, value).map_err(|e| MnsError::MarshalFailed {
        message: e.to_string(),
    })
}

/// Deserialize a response record from a raw body
pub fn from_xml<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, String> {
    let text = std::str::from_utf8(body).map_err(|e| e.to_string())?;
    quick_xml::de::from_str(text).map_err(|e| e.to_string())
}

// ============================================================================
// Error envelope
// ============================================================================

/// Standard error envelope (`<Error>`) returned with non-2xx statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub host_id: String,
}

// ============================================================================
// Queue messages
// ============================================================================

/// Body of a single send (`<Message>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageSendRequest {
    pub message_body: String,
    pub delay_seconds: i64,
    pub priority: i64,
}

impl MessageSendRequest {
    /// Create a request with no delay and the service's default priority
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_body: body.into(),
            delay_seconds: 0,
            priority: DEFAULT_MESSAGE_PRIORITY,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: i64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    /// Set the priority; 0 is replaced by the default when sent
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Copy of the request as it goes on the wire
    pub(crate) fn normalized(&self) -> Self {
        let mut request = self.clone();
        if request.priority == 0 {
            request.priority = DEFAULT_MESSAGE_PRIORITY;
        }
        request
    }
}

/// Body of a batch send (`<Messages>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchMessageSendRequest {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageSendRequest>,
}

/// Body of a batch delete (`<ReceiptHandles>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptHandles {
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handles: Vec<String>,
}

/// Result of a single send, also used per entry of a batch send result
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MessageSendResponse {
    pub message_id: String,
    #[serde(rename = "MessageBodyMD5")]
    pub message_body_md5: String,
    /// Present for delayed messages
    pub receipt_handle: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Batch send result (`<Messages>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchMessageSendResponse {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageSendResponse>,
}

/// A received or peeked message
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MessageReceiveResponse {
    pub message_id: String,
    pub receipt_handle: String,
    #[serde(rename = "MessageBodyMD5")]
    pub message_body_md5: String,
    pub message_body: String,
    pub enqueue_time: i64,
    pub next_visible_time: i64,
    pub first_dequeue_time: i64,
    pub dequeue_count: i64,
    pub priority: i64,
}

/// Batch receive or peek result (`<Messages>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchMessageReceiveResponse {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageReceiveResponse>,
}

/// Result of a visibility change (`<ChangeVisibility>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MessageVisibilityChangeResponse {
    pub receipt_handle: String,
    pub next_visible_time: i64,
}

/// One failed entry of a batch delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ErrorMessageResponse {
    pub error_code: String,
    pub error_message: String,
    pub receipt_handle: String,
}

/// Batch delete failures (`<Errors>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchMessageDeleteErrorResponse {
    #[serde(rename = "Error")]
    pub failed_messages: Vec<ErrorMessageResponse>,
}

// ============================================================================
// Queues
// ============================================================================

/// Queue attributes sent on create and set (`<Queue>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<i32>,
    #[serde(rename = "MaximumMessageSize", skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_retention_period: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polling_wait_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct QueueAttribute {
    pub queue_name: String,
    pub delay_seconds: i32,
    #[serde(rename = "MaximumMessageSize")]
    pub max_message_size: i32,
    pub message_retention_period: i32,
    pub visibility_timeout: i32,
    pub polling_wait_seconds: i32,
    pub active_messages: i64,
    pub inactive_messages: i64,
    pub delay_messages: i64,
    pub create_time: i64,
    pub last_modify_time: i64,
    pub logging_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueUrl {
    #[serde(rename = "QueueURL")]
    pub queue_url: String,
}

/// Plain queue listing (`<Queues>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Queues {
    #[serde(rename = "Queue")]
    pub queues: Vec<QueueUrl>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

/// Detailed queue listing (`<Queues>` with metadata)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueDetails {
    #[serde(rename = "Queue")]
    pub queues: Vec<QueueAttribute>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

// ============================================================================
// Topics and subscriptions
// ============================================================================

/// Topic attributes sent on create and set (`<Topic>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTopicRequest {
    #[serde(rename = "MaximumMessageSize")]
    pub max_message_size: i32,
    pub logging_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TopicAttribute {
    pub topic_name: String,
    pub message_count: i64,
    #[serde(rename = "MaximumMessageSize")]
    pub max_message_size: i32,
    pub message_retention_period: i64,
    pub create_time: i64,
    pub last_modify_time: i64,
    pub logging_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicUrl {
    #[serde(rename = "TopicURL")]
    pub topic_url: String,
}

/// Plain topic listing (`<Topics>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Topics {
    #[serde(rename = "Topic")]
    pub topics: Vec<TopicUrl>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicDetails {
    #[serde(rename = "Topic")]
    pub topics: Vec<TopicAttribute>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

/// Body of a topic publish (`<Message>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessagePublishRequest {
    pub message_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_tag: Option<String>,
}

impl MessagePublishRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_body: body.into(),
            message_tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.message_tag = Some(tag.into());
        self
    }
}

/// Retry policy the service applies when pushing to an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyStrategy {
    BackoffRetry,
    ExponentialDecayRetry,
}

impl NotifyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackoffRetry => "BACKOFF_RETRY",
            Self::ExponentialDecayRetry => "EXPONENTIAL_DECAY_RETRY",
        }
    }
}

impl fmt::Display for NotifyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotifyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BACKOFF_RETRY" => Ok(Self::BackoffRetry),
            "EXPONENTIAL_DECAY_RETRY" => Ok(Self::ExponentialDecayRetry),
            other => Err(format!("unknown notify strategy: {}", other)),
        }
    }
}

/// Body format of pushed notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyContentFormat {
    Xml,
    Json,
    Simplified,
}

impl NotifyContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Simplified => "SIMPLIFIED",
        }
    }
}

impl fmt::Display for NotifyContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotifyContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XML" => Ok(Self::Xml),
            "JSON" => Ok(Self::Json),
            "SIMPLIFIED" => Ok(Self::Simplified),
            other => Err(format!("unknown notify content format: {}", other)),
        }
    }
}

macro_rules! string_enum_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.trim().parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum_serde!(NotifyStrategy);
string_enum_serde!(NotifyContentFormat);

/// Body of a subscribe call (`<Subscription>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageSubscribeRequest {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_strategy: Option<NotifyStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_content_format: Option<NotifyContentFormat>,
}

impl MessageSubscribeRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            filter_tag: None,
            notify_strategy: None,
            notify_content_format: None,
        }
    }

    pub fn with_filter_tag(mut self, tag: impl Into<String>) -> Self {
        self.filter_tag = Some(tag.into());
        self
    }

    pub fn with_notify_strategy(mut self, strategy: NotifyStrategy) -> Self {
        self.notify_strategy = Some(strategy);
        self
    }

    pub fn with_notify_content_format(mut self, format: NotifyContentFormat) -> Self {
        self.notify_content_format = Some(format);
        self
    }
}

/// Body of a subscription attribute update (`<Subscription>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetSubscriptionAttributesRequest {
    pub notify_strategy: NotifyStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SubscriptionAttribute {
    pub subscription_name: String,
    pub subscriber: String,
    pub topic_owner: String,
    pub topic_name: String,
    pub endpoint: String,
    pub notify_strategy: Option<NotifyStrategy>,
    pub notify_content_format: Option<NotifyContentFormat>,
    pub filter_tag: String,
    pub create_time: i64,
    pub last_modify_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscriptionUrl {
    #[serde(rename = "SubscriptionURL")]
    pub subscription_url: String,
}

/// Plain subscription listing (`<Subscriptions>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Subscriptions {
    #[serde(rename = "Subscription")]
    pub subscriptions: Vec<SubscriptionUrl>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscriptionDetails {
    #[serde(rename = "Subscription")]
    pub subscriptions: Vec<SubscriptionAttribute>,
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

// ============================================================================
// Account
// ============================================================================

/// Result of opening the service for an account (`<OpenService>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OpenService {
    pub order_id: String,
}
