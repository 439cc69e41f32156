//! Resource managers.
//!
//! Managers create, inspect, update and delete queues and topics, and open
//! the service for an account. Their calls go through the same `send` path as
//! the handles but are not admitted through a QPS limiter.
//!
//! Names are trimmed and checked locally before any call is made, as are the
//! attribute ranges the service enforces:
//!
//! | Attribute                | Range            |
//! |--------------------------|------------------|
//! | delay seconds            | 0 ..= 60480      |
//! | maximum message size     | 1024 ..= 65536   |
//! | message retention period | 60 ..= 1296000   |
//! | visibility timeout       | 1 ..= 43200      |
//! | polling wait seconds     | 0 ..= 30         |

use crate::decoder::{Decoder, DiscardDecoder, SimpleDecoder};
use crate::error::{MnsError, ValidationError};
use crate::model::{
    CreateQueueRequest, CreateTopicRequest, OpenService, QueueAttribute, QueueDetails, Queues,
    TopicAttribute, TopicDetails, Topics,
};
use crate::send::{send, MnsRequest, Sent};
use crate::signer::Method;
use crate::transport::MnsTransport;
use crate::validation::{check_name, check_range, ListOptions};
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

pub const DEFAULT_DELAY_SECONDS: i32 = 0;
pub const DEFAULT_MAX_MESSAGE_SIZE: i32 = 65536;
pub const DEFAULT_MESSAGE_RETENTION_PERIOD: i32 = 345600;
pub const DEFAULT_VISIBILITY_TIMEOUT: i32 = 30;
pub const DEFAULT_POLLING_WAIT_SECONDS: i32 = 0;

async fn call<D: Decoder>(
    transport: &dyn MnsTransport,
    decoder: &D,
    request: MnsRequest,
) -> Result<Sent<D::Output>, MnsError> {
    send(transport, None, decoder, request).await
}

fn check_max_message_size(size: i32) -> Result<(), ValidationError> {
    check_range("max message size", i64::from(size), 1024, 65536)
}

// ============================================================================
// Queue manager
// ============================================================================

/// Queue attributes for create and update calls
///
/// Unset fields take the service defaults on create and are left untouched
/// on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueOptions {
    pub delay_seconds: Option<i32>,
    pub max_message_size: Option<i32>,
    pub message_retention_period: Option<i32>,
    pub visibility_timeout: Option<i32>,
    pub polling_wait_seconds: Option<i32>,
    pub logging_enabled: Option<bool>,
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay_seconds(mut self, seconds: i32) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    pub fn with_max_message_size(mut self, size: i32) -> Self {
        self.max_message_size = Some(size);
        self
    }

    pub fn with_message_retention_period(mut self, seconds: i32) -> Self {
        self.message_retention_period = Some(seconds);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_polling_wait_seconds(mut self, seconds: i32) -> Self {
        self.polling_wait_seconds = Some(seconds);
        self
    }

    pub fn with_logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = Some(enabled);
        self
    }

    /// Copy with every unset field filled with its default
    pub fn with_defaults(&self) -> Self {
        Self {
            delay_seconds: Some(self.delay_seconds.unwrap_or(DEFAULT_DELAY_SECONDS)),
            max_message_size: Some(self.max_message_size.unwrap_or(DEFAULT_MAX_MESSAGE_SIZE)),
            message_retention_period: Some(
                self.message_retention_period
                    .unwrap_or(DEFAULT_MESSAGE_RETENTION_PERIOD),
            ),
            visibility_timeout: Some(
                self.visibility_timeout
                    .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT),
            ),
            polling_wait_seconds: Some(
                self.polling_wait_seconds
                    .unwrap_or(DEFAULT_POLLING_WAIT_SECONDS),
            ),
            logging_enabled: Some(self.logging_enabled.unwrap_or(false)),
        }
    }

    /// Check every set field against its allowed range
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(delay) = self.delay_seconds {
            check_range("delay seconds", i64::from(delay), 0, 60480)?;
        }
        if let Some(size) = self.max_message_size {
            check_max_message_size(size)?;
        }
        if let Some(period) = self.message_retention_period {
            check_range("message retention period", i64::from(period), 60, 1_296_000)?;
        }
        if let Some(timeout) = self.visibility_timeout {
            check_range("visibility timeout", i64::from(timeout), 1, 43200)?;
        }
        if let Some(wait) = self.polling_wait_seconds {
            check_range("polling wait seconds", i64::from(wait), 0, 30)?;
        }
        Ok(())
    }

    fn to_request(&self) -> CreateQueueRequest {
        CreateQueueRequest {
            delay_seconds: self.delay_seconds,
            max_message_size: self.max_message_size,
            message_retention_period: self.message_retention_period,
            visibility_timeout: self.visibility_timeout,
            polling_wait_seconds: self.polling_wait_seconds,
            logging_enabled: self.logging_enabled,
        }
    }
}

/// Creates, updates, inspects and deletes queues
#[derive(Clone)]
pub struct QueueManager {
    transport: Arc<dyn MnsTransport>,
}

impl QueueManager {
    pub fn new(transport: Arc<dyn MnsTransport>) -> Self {
        Self { transport }
    }

    /// Create a queue with default attributes
    pub async fn create_simple_queue(&self, queue_name: &str) -> Result<(), MnsError> {
        self.create_queue(queue_name, &QueueOptions::new()).await
    }

    /// Create a queue; unset options take their defaults
    ///
    /// Fails with [`MnsError::QueueAlreadyExistSameAttributes`] when a queue
    /// with the same name and attributes already exists.
    pub async fn create_queue(
        &self,
        queue_name: &str,
        options: &QueueOptions,
    ) -> Result<(), MnsError> {
        let queue_name = check_name("queue name", queue_name)?;
        let options = options.with_defaults();
        options.validate()?;

        let request = MnsRequest::new(Method::Put, format!("queues/{}", queue_name))
            .with_xml_body("Queue", &options.to_request())?;

        let sent = call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        if sent.status == 204 {
            return Err(MnsError::QueueAlreadyExistSameAttributes { name: queue_name });
        }

        info!(queue = %queue_name, "Queue created");
        Ok(())
    }

    /// Create a queue with every attribute given explicitly and logging off
    pub async fn create_queue_with_attributes(
        &self,
        queue_name: &str,
        delay_seconds: i32,
        max_message_size: i32,
        message_retention_period: i32,
        visibility_timeout: i32,
        polling_wait_seconds: i32,
    ) -> Result<(), MnsError> {
        let options = QueueOptions::new()
            .with_delay_seconds(delay_seconds)
            .with_max_message_size(max_message_size)
            .with_message_retention_period(message_retention_period)
            .with_visibility_timeout(visibility_timeout)
            .with_polling_wait_seconds(polling_wait_seconds)
            .with_logging_enabled(false);
        self.create_queue(queue_name, &options).await
    }

    /// Update the attributes that are set in `options`
    pub async fn set_queue_attributes(
        &self,
        queue_name: &str,
        options: &QueueOptions,
    ) -> Result<(), MnsError> {
        let queue_name = check_name("queue name", queue_name)?;
        options.validate()?;

        let request = MnsRequest::new(
            Method::Put,
            format!("queues/{}?metaoverride=true", queue_name),
        )
        .with_xml_body("Queue", &options.to_request())?;

        call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        Ok(())
    }

    pub async fn get_queue_attributes(&self, queue_name: &str) -> Result<QueueAttribute, MnsError> {
        let queue_name = check_name("queue name", queue_name)?;
        let request = MnsRequest::new(Method::Get, format!("queues/{}", queue_name));

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    pub async fn delete_queue(&self, queue_name: &str) -> Result<(), MnsError> {
        let queue_name = check_name("queue name", queue_name)?;
        let request = MnsRequest::new(Method::Delete, format!("queues/{}", queue_name));

        call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        info!(queue = %queue_name, "Queue deleted");
        Ok(())
    }

    pub async fn list_queues(&self, options: &ListOptions) -> Result<Queues, MnsError> {
        let request = MnsRequest::new(Method::Get, "queues").with_headers(options.to_headers(false)?);

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    pub async fn list_queue_details(&self, options: &ListOptions) -> Result<QueueDetails, MnsError> {
        let request = MnsRequest::new(Method::Get, "queues").with_headers(options.to_headers(true)?);

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }
}

// ============================================================================
// Topic manager
// ============================================================================

/// Creates, updates, inspects and deletes topics
#[derive(Clone)]
pub struct TopicManager {
    transport: Arc<dyn MnsTransport>,
}

impl TopicManager {
    pub fn new(transport: Arc<dyn MnsTransport>) -> Self {
        Self { transport }
    }

    pub async fn create_simple_topic(&self, topic_name: &str) -> Result<(), MnsError> {
        self.create_topic(topic_name, DEFAULT_MAX_MESSAGE_SIZE, false)
            .await
    }

    /// Create a topic
    ///
    /// Fails with [`MnsError::TopicAlreadyExistSameAttributes`] when a topic
    /// with the same name and attributes already exists.
    pub async fn create_topic(
        &self,
        topic_name: &str,
        max_message_size: i32,
        logging_enabled: bool,
    ) -> Result<(), MnsError> {
        let topic_name = check_name("topic name", topic_name)?;
        check_max_message_size(max_message_size)?;

        let body = CreateTopicRequest {
            max_message_size,
            logging_enabled,
        };
        let request = MnsRequest::new(Method::Put, format!("topics/{}", topic_name))
            .with_xml_body("Topic", &body)?;

        let sent = call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        if sent.status == 204 {
            return Err(MnsError::TopicAlreadyExistSameAttributes { name: topic_name });
        }

        info!(topic = %topic_name, "Topic created");
        Ok(())
    }

    pub async fn set_topic_attributes(
        &self,
        topic_name: &str,
        max_message_size: i32,
        logging_enabled: bool,
    ) -> Result<(), MnsError> {
        let topic_name = check_name("topic name", topic_name)?;
        check_max_message_size(max_message_size)?;

        let body = CreateTopicRequest {
            max_message_size,
            logging_enabled,
        };
        let request = MnsRequest::new(
            Method::Put,
            format!("topics/{}?metaoverride=true", topic_name),
        )
        .with_xml_body("Topic", &body)?;

        call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        Ok(())
    }

    pub async fn get_topic_attributes(&self, topic_name: &str) -> Result<TopicAttribute, MnsError> {
        let topic_name = check_name("topic name", topic_name)?;
        let request = MnsRequest::new(Method::Get, format!("topics/{}", topic_name));

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    pub async fn delete_topic(&self, topic_name: &str) -> Result<(), MnsError> {
        let topic_name = check_name("topic name", topic_name)?;
        let request = MnsRequest::new(Method::Delete, format!("topics/{}", topic_name));

        call(self.transport.as_ref(), &DiscardDecoder, request).await?;
        info!(topic = %topic_name, "Topic deleted");
        Ok(())
    }

    pub async fn list_topics(&self, options: &ListOptions) -> Result<Topics, MnsError> {
        let request = MnsRequest::new(Method::Get, "topics").with_headers(options.to_headers(false)?);

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    pub async fn list_topic_details(&self, options: &ListOptions) -> Result<TopicDetails, MnsError> {
        let request = MnsRequest::new(Method::Get, "topics").with_headers(options.to_headers(true)?);

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }
}

// ============================================================================
// Account manager
// ============================================================================

/// Account-level operations
#[derive(Clone)]
pub struct AccountManager {
    transport: Arc<dyn MnsTransport>,
}

impl AccountManager {
    pub fn new(transport: Arc<dyn MnsTransport>) -> Self {
        Self { transport }
    }

    /// Enable the service for the account, returning the order id
    pub async fn open_service(&self) -> Result<OpenService, MnsError> {
        let request = MnsRequest::new(Method::Post, "commonbuy/openservice");

        call(self.transport.as_ref(), &SimpleDecoder::new(), request)
            .await?
            .into_value()
    }
}
