//! # MNS Runtime
//!
//! Client runtime for the MNS message queue and topic service, reached over
//! HTTP with XML payloads.
//!
//! Every operation funnels through one request path: the handle's QPS limiter
//! admits the call, the transport signs and sends it, and a decoder turns the
//! raw response into a typed value or a typed error.
//!
//! This library provides:
//! - Request signing with a pluggable signature strategy
//! - Per-handle sliding-window QPS limiting
//! - Decoding of single results, error envelopes and partial batch failures
//! - Long-poll receive with ordered delivery of successes and errors
//! - Queue and topic handles plus queue, topic and account managers
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all operations
//! - [`classifier`] - Service error code table
//! - [`signer`] - Canonical string-to-sign and the authorization header
//! - [`transport`] - Signed HTTP calls
//! - [`decoder`] - Simple and batch-aware response decoding
//! - [`qps`] - Per-handle rate limiting
//! - [`send`] - The shared request path
//! - [`receiver`] - Long-poll receive protocol
//! - [`queue`], [`topic`] - Resource handles
//! - [`manager`] - Queue, topic and account management
//!
//! ## Example
//!
//! ```no_run
//! use mns_runtime::{ClientConfig, MessageSendRequest, MnsClient};
//!
//! # async fn example() -> Result<(), mns_runtime::MnsError> {
//! let config = ClientConfig::new("https://1234.mns.cn-hangzhou.aliyuncs.com")
//!     .with_credentials("key-id", "key-secret");
//! let client = MnsClient::from_config(&config)?;
//!
//! let queue = client.queue("orders");
//! let sent = queue.send_message(&MessageSendRequest::new("hello")).await?;
//! println!("sent {}", sent.message_id);
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod classifier;
pub mod client;
pub mod config;
pub mod credentials;
pub mod decoder;
pub mod error;
pub mod manager;
pub mod model;
pub mod qps;
pub mod queue;
pub mod receiver;
pub mod send;
pub mod signer;
pub mod topic;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// Re-export commonly used types at crate root for convenience
pub use classifier::{ErrorClassifier, ProviderErrorKind};
pub use client::MnsClient;
pub use config::ClientConfig;
pub use credentials::{
    Credential, CredentialError, CredentialProvider, EnvironmentCredentialProvider,
    StaticCredentialProvider,
};
pub use decoder::{BatchDecoder, BatchItemOutcome, BatchOutcome, Decoder, SimpleDecoder};
pub use error::{ConfigurationError, MnsError, ProviderError, ValidationError};
pub use manager::{AccountManager, QueueManager, QueueOptions, TopicManager};
pub use model::{
    MessagePublishRequest, MessageReceiveResponse, MessageSendRequest, MessageSendResponse,
    MessageSubscribeRequest, NotifyContentFormat, NotifyStrategy,
};
pub use qps::QpsMonitor;
pub use queue::QueueClient;
pub use receiver::{PollState, ReceiveOutcome};
pub use send::{send, MnsRequest, Sent};
pub use signer::{
    HmacSha1Signature, Method, RequestHeaders, SignatureError, SignatureStrategy, Signer,
};
pub use topic::TopicClient;
pub use transport::{HttpTransport, MnsTransport, RawResponse};
pub use validation::ListOptions;
