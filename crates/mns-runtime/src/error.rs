//! Error types for MNS operations.

use crate::classifier::ProviderErrorKind;
use crate::decoder::BatchOutcome;
use thiserror::Error;

/// Comprehensive error type for all MNS operations
#[derive(Debug, Error)]
pub enum MnsError {
    #[error("Marshal message failed: {message}")]
    MarshalFailed { message: String },

    #[error("Failed to build authorization header: {message}")]
    AuthorizationFailed { message: String },

    #[error("Send request failed: {message}")]
    SendFailed { message: String, timed_out: bool },

    #[error("Read response body failed: {message}")]
    ReadResponseFailed { message: String },

    #[error("Unmarshal response failed: {message}")]
    UnmarshalResponseFailed { message: String },

    #[error("Unmarshal error response failed: {message}, body: \"{body}\"")]
    UnmarshalErrorResponseFailed { message: String, body: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The service accepted the batch but one or more items failed, or the
    /// body could not be read as either a batch result or an error envelope.
    #[error("Batch operation failed (status {status})")]
    BatchOperationFailed {
        status: u16,
        outcome: Option<BatchOutcome>,
        parse_error: Option<String>,
    },

    #[error("Queue '{name}' already exists with the same attributes")]
    QueueAlreadyExistSameAttributes { name: String },

    #[error("Topic '{name}' already exists with the same attributes")]
    TopicAlreadyExistSameAttributes { name: String },

    #[error("Subscription '{name}' already exists with the same attributes")]
    SubscriptionAlreadyExistSameAttributes { name: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl MnsError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MarshalFailed { .. } => false,
            Self::AuthorizationFailed { .. } => false,
            Self::SendFailed { .. } => true,
            Self::ReadResponseFailed { .. } => true,
            Self::UnmarshalResponseFailed { .. } => false,
            Self::UnmarshalErrorResponseFailed { .. } => false,
            Self::Provider(e) => e.kind.is_transient(),
            Self::BatchOperationFailed { .. } => false,
            Self::QueueAlreadyExistSameAttributes { .. } => false,
            Self::TopicAlreadyExistSameAttributes { .. } => false,
            Self::SubscriptionAlreadyExistSameAttributes { .. } => false,
            Self::Validation(_) => false,
            Self::Configuration(_) => false,
        }
    }

    /// Get the classified provider error kind, if the service reported one
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Check if the error reports a create call against an identical resource
    pub fn is_already_exist_same_attributes(&self) -> bool {
        matches!(
            self,
            Self::QueueAlreadyExistSameAttributes { .. }
                | Self::TopicAlreadyExistSameAttributes { .. }
                | Self::SubscriptionAlreadyExistSameAttributes { .. }
        )
    }

    /// Get the per-item outcomes of a failed batch operation
    pub fn batch_outcome(&self) -> Option<&BatchOutcome> {
        match self {
            Self::BatchOperationFailed { outcome, .. } => outcome.as_ref(),
            _ => None,
        }
    }
}

/// Service-reported failure decoded from the standard error envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "mns response status error, code: {code}, message: {message}, resource: {resource}, \
     request id: {request_id}, host id: {host_id}"
)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub host_id: String,
    pub resource: String,
}

/// Local validation failures raised before a request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("{field} is too long, the max length is {max}")]
    TooLong { field: String, max: usize },

    #[error("{field} is not in range of ({min}~{max})")]
    OutOfRange { field: String, min: i64, max: i64 },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
