//! Topic handle.
//!
//! A [`TopicClient`] publishes to one topic and manages its subscriptions.
//! Like [`QueueClient`](crate::queue::QueueClient) it owns a [`QpsMonitor`]
//! shared by its clones.

use crate::decoder::{Decoder, DiscardDecoder, SimpleDecoder};
use crate::error::MnsError;
use crate::model::{
    MessagePublishRequest, MessageSendResponse, MessageSubscribeRequest, NotifyStrategy,
    SetSubscriptionAttributesRequest, SubscriptionAttribute, SubscriptionDetails, Subscriptions,
};
use crate::qps::QpsMonitor;
use crate::send::{send, MnsRequest, Sent};
use crate::signer::Method;
use crate::transport::MnsTransport;
use crate::validation::{check_name, ListOptions};
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;

/// Handle for publishing to and subscribing on a single topic
#[derive(Clone)]
pub struct TopicClient {
    name: String,
    transport: Arc<dyn MnsTransport>,
    limiter: Arc<QpsMonitor>,
}

impl TopicClient {
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn MnsTransport>,
        limiter: Arc<QpsMonitor>,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            limiter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qps_monitor(&self) -> &Arc<QpsMonitor> {
        &self.limiter
    }

    /// Endpoint that delivers notifications into a queue of the same account
    pub fn generate_queue_endpoint(&self, queue_name: &str) -> String {
        format!(
            "acs:mns:{}:{}:queues/{}",
            self.transport.region(),
            self.transport.account_id(),
            queue_name
        )
    }

    /// Endpoint that delivers notifications by mail
    pub fn generate_mail_endpoint(&self, mail_address: &str) -> String {
        format!("mail:directmail:{}", mail_address)
    }

    fn subscription_resource(&self, subscription_name: &str) -> String {
        format!("topics/{}/subscriptions/{}", self.name, subscription_name)
    }

    async fn call<D: Decoder>(
        &self,
        decoder: &D,
        request: MnsRequest,
    ) -> Result<Sent<D::Output>, MnsError> {
        send(
            self.transport.as_ref(),
            Some(self.limiter.as_ref()),
            decoder,
            request,
        )
        .await
    }

    pub async fn publish_message(
        &self,
        message: &MessagePublishRequest,
    ) -> Result<MessageSendResponse, MnsError> {
        let request = MnsRequest::new(Method::Post, format!("topics/{}/messages", self.name))
            .with_xml_body("Message", message)?;

        self.call(&SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    /// Create a subscription
    ///
    /// Fails with [`MnsError::SubscriptionAlreadyExistSameAttributes`] when an
    /// identical subscription already exists.
    pub async fn subscribe(
        &self,
        subscription_name: &str,
        subscription: &MessageSubscribeRequest,
    ) -> Result<(), MnsError> {
        let subscription_name = check_name("subscription name", subscription_name)?;
        let request = MnsRequest::new(Method::Put, self.subscription_resource(&subscription_name))
            .with_xml_body("Subscription", subscription)?;

        let sent = self.call(&DiscardDecoder, request).await?;
        if sent.status == 204 {
            return Err(MnsError::SubscriptionAlreadyExistSameAttributes {
                name: subscription_name,
            });
        }

        info!(topic = %self.name, subscription = %subscription_name, "Subscription created");
        Ok(())
    }

    pub async fn set_subscription_attributes(
        &self,
        subscription_name: &str,
        notify_strategy: NotifyStrategy,
    ) -> Result<(), MnsError> {
        let subscription_name = check_name("subscription name", subscription_name)?;
        let resource = format!(
            "{}?metaoverride=true",
            self.subscription_resource(&subscription_name)
        );
        let request = MnsRequest::new(Method::Put, resource).with_xml_body(
            "Subscription",
            &SetSubscriptionAttributesRequest { notify_strategy },
        )?;

        self.call(&DiscardDecoder, request).await?;
        Ok(())
    }

    pub async fn get_subscription_attributes(
        &self,
        subscription_name: &str,
    ) -> Result<SubscriptionAttribute, MnsError> {
        let subscription_name = check_name("subscription name", subscription_name)?;
        let request = MnsRequest::new(Method::Get, self.subscription_resource(&subscription_name));

        self.call(&SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    pub async fn unsubscribe(&self, subscription_name: &str) -> Result<(), MnsError> {
        let subscription_name = check_name("subscription name", subscription_name)?;
        let request =
            MnsRequest::new(Method::Delete, self.subscription_resource(&subscription_name));

        self.call(&DiscardDecoder, request).await?;
        info!(topic = %self.name, subscription = %subscription_name, "Subscription removed");
        Ok(())
    }

    /// List subscription URLs, one page at a time
    pub async fn list_subscriptions(
        &self,
        options: &ListOptions,
    ) -> Result<Subscriptions, MnsError> {
        let request = MnsRequest::new(Method::Get, format!("topics/{}/subscriptions", self.name))
            .with_headers(options.to_headers(false)?);

        self.call(&SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    /// List subscriptions with their attributes
    pub async fn list_subscription_details(
        &self,
        options: &ListOptions,
    ) -> Result<SubscriptionDetails, MnsError> {
        let request = MnsRequest::new(Method::Get, format!("topics/{}/subscriptions", self.name))
            .with_headers(options.to_headers(true)?);

        self.call(&SimpleDecoder::new(), request)
            .await?
            .into_value()
    }
}

impl fmt::Debug for TopicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicClient")
            .field("name", &self.name)
            .field("qps_ceiling", &self.limiter.ceiling())
            .finish()
    }
}
