//! Queue handle.
//!
//! A [`QueueClient`] is bound to one queue name and owns the [`QpsMonitor`]
//! every message operation on that queue is admitted through. Handles are
//! cheap to clone; clones share the transport and the limiter.
//!
//! Receive operations follow the long-poll protocol of
//! [`PollingReceiver`](crate::receiver::PollingReceiver): outcomes are pushed
//! into the caller's channel rather than returned.

use crate::decoder::{BatchDecoder, BatchOutcome, Decoder, DiscardDecoder, SimpleDecoder};
use crate::error::MnsError;
use crate::model::{
    BatchMessageDeleteErrorResponse, BatchMessageReceiveResponse, BatchMessageSendRequest,
    BatchMessageSendResponse, MessageReceiveResponse, MessageSendRequest, MessageSendResponse,
    MessageVisibilityChangeResponse, ReceiptHandles,
};
use crate::qps::QpsMonitor;
use crate::receiver::{PollState, PollingReceiver, ReceiveOutcome};
use crate::send::{send, MnsRequest, Sent};
use crate::signer::Method;
use crate::transport::MnsTransport;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Messages requested by batch receive and batch peek when none is given
pub const DEFAULT_NUM_OF_MESSAGES: i32 = 16;

/// Handle for message operations on a single queue
#[derive(Clone)]
pub struct QueueClient {
    name: String,
    transport: Arc<dyn MnsTransport>,
    limiter: Arc<QpsMonitor>,
    receiver: PollingReceiver,
}

impl QueueClient {
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn MnsTransport>,
        limiter: Arc<QpsMonitor>,
    ) -> Self {
        let receiver = PollingReceiver::new(transport.clone(), limiter.clone());
        Self {
            name: name.into(),
            transport,
            limiter,
            receiver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Limiter shared by every operation on this handle
    pub fn qps_monitor(&self) -> &Arc<QpsMonitor> {
        &self.limiter
    }

    fn messages_resource(&self) -> String {
        format!("queues/{}/messages", self.name)
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

    /// Send one message; a priority of 0 is sent as the default priority
    pub async fn send_message(
        &self,
        message: &MessageSendRequest,
    ) -> Result<MessageSendResponse, MnsError> {
        let request = MnsRequest::new(Method::Post, self.messages_resource())
            .with_xml_body("Message", &message.normalized())?;

        self.call(&SimpleDecoder::new(), request)
            .await?
            .into_value()
    }

    /// Send several messages in one call
    ///
    /// Returns one outcome per message in input order. When any message is
    /// rejected the call fails with [`MnsError::BatchOperationFailed`] and the
    /// outcomes are available through [`MnsError::batch_outcome`]. An empty
    /// list issues no call, and an empty success body yields an empty outcome.
    pub async fn batch_send_message(
        &self,
        messages: &[MessageSendRequest],
    ) -> Result<BatchOutcome, MnsError> {
        if messages.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let body = BatchMessageSendRequest {
            messages: messages.iter().map(MessageSendRequest::normalized).collect(),
        };
        let request = MnsRequest::new(Method::Post, self.messages_resource())
            .with_xml_body("Messages", &body)?;

        // An empty success body carries no per-item results
        let sent = self
            .call(&BatchDecoder::<BatchMessageSendResponse>::new(), request)
            .await?;
        Ok(sent.value.unwrap_or_default())
    }

    /// Long-poll for one message, delivering outcomes into `sink`
    pub async fn receive_message(
        &self,
        wait_seconds: &[i64],
        sink: &UnboundedSender<ReceiveOutcome<MessageReceiveResponse>>,
    ) -> PollState {
        self.receiver
            .poll(&self.messages_resource(), wait_seconds, sink)
            .await
    }

    /// [`receive_message`](Self::receive_message) on a background task
    pub fn spawn_receive_message(
        &self,
        wait_seconds: Vec<i64>,
        sink: UnboundedSender<ReceiveOutcome<MessageReceiveResponse>>,
    ) -> JoinHandle<PollState> {
        self.receiver
            .spawn_poll(self.messages_resource(), wait_seconds, sink)
    }

    /// Long-poll for up to `num_of_messages` messages (16 when not positive)
    pub async fn batch_receive_message(
        &self,
        num_of_messages: i32,
        wait_seconds: &[i64],
        sink: &UnboundedSender<ReceiveOutcome<BatchMessageReceiveResponse>>,
    ) -> PollState {
        self.receiver
            .poll(&self.batch_resource(num_of_messages), wait_seconds, sink)
            .await
    }

    pub fn spawn_batch_receive_message(
        &self,
        num_of_messages: i32,
        wait_seconds: Vec<i64>,
        sink: UnboundedSender<ReceiveOutcome<BatchMessageReceiveResponse>>,
    ) -> JoinHandle<PollState> {
        self.receiver
            .spawn_poll(self.batch_resource(num_of_messages), wait_seconds, sink)
    }

    fn batch_resource(&self, num_of_messages: i32) -> String {
        let count = if num_of_messages <= 0 {
            DEFAULT_NUM_OF_MESSAGES
        } else {
            num_of_messages
        };
        format!("{}?numOfMessages={}", self.messages_resource(), count)
    }

    /// Look at the next message without changing its visibility
    pub async fn peek_message(&self) -> Result<MessageReceiveResponse, MnsError> {
        let resource = format!("{}?peekonly=true", self.messages_resource());
        self.call(&SimpleDecoder::new(), MnsRequest::new(Method::Get, resource))
            .await?
            .into_value()
    }

    pub async fn batch_peek_message(
        &self,
        num_of_messages: i32,
    ) -> Result<BatchMessageReceiveResponse, MnsError> {
        let resource = format!("{}&peekonly=true", self.batch_resource(num_of_messages));
        self.call(&SimpleDecoder::new(), MnsRequest::new(Method::Get, resource))
            .await?
            .into_value()
    }

    pub async fn delete_message(&self, receipt_handle: &str) -> Result<(), MnsError> {
        let resource = format!(
            "{}?ReceiptHandle={}",
            self.messages_resource(),
            urlencoding::encode(receipt_handle)
        );
        self.call(&DiscardDecoder, MnsRequest::new(Method::Delete, resource))
            .await?;
        Ok(())
    }

    /// Delete several messages in one call
    ///
    /// The service only reports the handles it failed to delete; outcomes are
    /// aligned with `receipt_handles` so every requested handle gets one. An
    /// empty list issues no call.
    pub async fn batch_delete_message(
        &self,
        receipt_handles: &[String],
    ) -> Result<BatchOutcome, MnsError> {
        if receipt_handles.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let body = ReceiptHandles {
            receipt_handles: receipt_handles.to_vec(),
        };
        let request = MnsRequest::new(Method::Delete, self.messages_resource())
            .with_xml_body("ReceiptHandles", &body)?;
        let decoder =
            BatchDecoder::<BatchMessageDeleteErrorResponse>::with_request_keys(receipt_handles.to_vec());

        let sent = self.call(&decoder, request).await?;
        Ok(sent
            .value
            .unwrap_or_else(|| BatchOutcome::all_deleted(receipt_handles)))
    }

    /// Extend or shorten how long a received message stays invisible
    pub async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        visibility_timeout: i64,
    ) -> Result<MessageVisibilityChangeResponse, MnsError> {
        let resource = format!(
            "{}?ReceiptHandle={}&VisibilityTimeout={}",
            self.messages_resource(),
            urlencoding::encode(receipt_handle),
            visibility_timeout
        );
        debug!(queue = %self.name, visibility_timeout, "Changing message visibility");
        self.call(&SimpleDecoder::new(), MnsRequest::new(Method::Put, resource))
            .await?
            .into_value()
    }
}

impl fmt::Debug for QueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueClient")
            .field("name", &self.name)
            .field("qps_ceiling", &self.limiter.ceiling())
            .finish()
    }
}
