//! Long-poll receive protocol.
//!
//! A receive invocation walks an ordered list of candidate wait durations.
//! Candidates of zero or less are skipped. Each remaining candidate is
//! admitted through the handle's [`QpsMonitor`] and issued as one receive
//! call with `waitseconds` encoded in the resource:
//!
//! - a success is delivered and ends the invocation ([`PollState::Delivered`]);
//!   later candidates are not tried;
//! - an error is delivered and the next candidate is tried;
//! - running out of candidates ends the invocation silently
//!   ([`PollState::Exhausted`]).
//!
//! An empty candidate list means exactly one attempt with no wait parameter,
//! ending in `Delivered` or [`PollState::Failed`].
//!
//! Outcomes are pushed as [`ReceiveOutcome`] values into one unbounded
//! channel, so a consumer observes successes and errors in order. A dropped
//! receiving end is not an error; the invocation simply finishes.

use crate::decoder::SimpleDecoder;
use crate::error::MnsError;
use crate::qps::QpsMonitor;
use crate::send::{send, MnsRequest, Sent};
use crate::signer::Method;
use crate::transport::MnsTransport;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[cfg(test)]
#[path = "receiver_tests.rs"]
mod tests;

/// Result delivered for one terminal receive attempt
pub type ReceiveOutcome<T> = Result<T, MnsError>;

/// How a receive invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// A result was delivered
    Delivered,
    /// The single zero-wait attempt failed and its error was delivered
    Failed,
    /// Every candidate was skipped or failed
    Exhausted,
}

/// One planned receive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub wait_seconds: i64,
    pub resource: String,
}

impl PollAttempt {
    /// Expand candidate waits into the attempts to issue, in order
    pub fn plan(base_resource: &str, wait_seconds: &[i64]) -> Vec<PollAttempt> {
        if wait_seconds.is_empty() {
            return vec![PollAttempt {
                wait_seconds: 0,
                resource: base_resource.to_string(),
            }];
        }

        let separator = if base_resource.contains('?') { '&' } else { '?' };
        wait_seconds
            .iter()
            .filter(|wait| **wait > 0)
            .map(|wait| PollAttempt {
                wait_seconds: *wait,
                resource: format!("{}{}waitseconds={}", base_resource, separator, wait),
            })
            .collect()
    }
}

/// Runs receive invocations for one queue handle
#[derive(Clone)]
pub struct PollingReceiver {
    transport: Arc<dyn MnsTransport>,
    limiter: Arc<QpsMonitor>,
}

impl PollingReceiver {
    pub fn new(transport: Arc<dyn MnsTransport>, limiter: Arc<QpsMonitor>) -> Self {
        Self { transport, limiter }
    }

    /// Run one receive invocation, delivering outcomes into `sink`
    pub async fn poll<T>(
        &self,
        base_resource: &str,
        wait_seconds: &[i64],
        sink: &UnboundedSender<ReceiveOutcome<T>>,
    ) -> PollState
    where
        T: DeserializeOwned + Send + 'static,
    {
        let single_attempt = wait_seconds.is_empty();
        let decoder = SimpleDecoder::<T>::new();

        for attempt in PollAttempt::plan(base_resource, wait_seconds) {
            let request = MnsRequest::new(Method::Get, attempt.resource.as_str());
            let result = send(
                self.transport.as_ref(),
                Some(self.limiter.as_ref()),
                &decoder,
                request,
            )
            .await
            .and_then(Sent::into_value);

            match result {
                Ok(value) => {
                    deliver(sink, Ok(value));
                    return PollState::Delivered;
                }
                Err(e) => {
                    debug!(
                        resource = %attempt.resource,
                        wait_seconds = attempt.wait_seconds,
                        error = %e,
                        "Receive attempt failed"
                    );
                    deliver(sink, Err(e));
                    if single_attempt {
                        return PollState::Failed;
                    }
                }
            }
        }

        PollState::Exhausted
    }

    /// Run a receive invocation on a background task
    pub fn spawn_poll<T>(
        &self,
        base_resource: String,
        wait_seconds: Vec<i64>,
        sink: UnboundedSender<ReceiveOutcome<T>>,
    ) -> JoinHandle<PollState>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let receiver = self.clone();
        tokio::spawn(async move { receiver.poll(&base_resource, &wait_seconds, &sink).await })
    }
}

fn deliver<T>(sink: &UnboundedSender<ReceiveOutcome<T>>, outcome: ReceiveOutcome<T>) {
    if sink.send(outcome).is_err() {
        debug!("Receive outcome dropped, consumer has gone away");
    }
}
