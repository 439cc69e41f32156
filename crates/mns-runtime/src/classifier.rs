//! Mapping of provider error codes to typed error kinds.
//!
//! The service reports failures as an XML envelope carrying an opaque textual
//! `Code`. [`ErrorClassifier`] owns an immutable table from the known codes to
//! [`ProviderErrorKind`] and turns an envelope into a [`ProviderError`].
//! Unrecognized codes map to [`ProviderErrorKind::Unknown`]; classification is
//! total.

use crate::error::ProviderError;
use crate::model::ErrorResponse;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;

/// Typed kind of a service-reported error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    AccessDenied,
    InvalidAccessKeyId,
    InternalError,
    InvalidAuthorizationHeader,
    InvalidDateHeader,
    InvalidArgument,
    InvalidDigest,
    InvalidRequestUrl,
    InvalidQueryString,
    MalformedXml,
    MissingAuthorizationHeader,
    MissingDateHeader,
    MissingVersionHeader,
    MissingReceiptHandle,
    MissingVisibilityTimeout,
    MessageNotExist,
    QueueAlreadyExist,
    QueueDeletedRecently,
    InvalidQueueName,
    InvalidVersionHeader,
    InvalidContentType,
    QueueNameLengthError,
    QueueNotExist,
    ReceiptHandleError,
    SignatureDoesNotMatch,
    TimeExpired,
    QpsLimitExceeded,
    TopicAlreadyExist,
    TopicNameLengthError,
    TopicNotExist,
    SubscriptionNameLengthError,
    InvalidTopicName,
    InvalidSubscriptionName,
    SubscriptionAlreadyExist,
    InvalidEndpoint,
    SubscriberNotExist,
    /// Code not present in the table; the envelope is still carried
    Unknown,
}

/// Wire codes as the service spells them, including its own misspellings.
const KNOWN_CODES: &[(&str, ProviderErrorKind)] = &[
    ("AccessDenied", ProviderErrorKind::AccessDenied),
    ("InvalidAccessKeyId", ProviderErrorKind::InvalidAccessKeyId),
    ("InternalError", ProviderErrorKind::InternalError),
    (
        "InvalidAuthorizationHeader",
        ProviderErrorKind::InvalidAuthorizationHeader,
    ),
    ("InvalidDateHeader", ProviderErrorKind::InvalidDateHeader),
    ("InvalidArgument", ProviderErrorKind::InvalidArgument),
    ("InvalidDegist", ProviderErrorKind::InvalidDigest),
    ("InvalidRequestURL", ProviderErrorKind::InvalidRequestUrl),
    ("InvalidQueryString", ProviderErrorKind::InvalidQueryString),
    ("MalformedXML", ProviderErrorKind::MalformedXml),
    (
        "MissingAuthorizationHeader",
        ProviderErrorKind::MissingAuthorizationHeader,
    ),
    ("MissingDateHeader", ProviderErrorKind::MissingDateHeader),
    ("MissingVersionHeader", ProviderErrorKind::MissingVersionHeader),
    ("MissingReceiptHandle", ProviderErrorKind::MissingReceiptHandle),
    (
        "MissingVisibilityTimeout",
        ProviderErrorKind::MissingVisibilityTimeout,
    ),
    ("MessageNotExist", ProviderErrorKind::MessageNotExist),
    ("QueueAlreadyExist", ProviderErrorKind::QueueAlreadyExist),
    ("QueueDeletedRecently", ProviderErrorKind::QueueDeletedRecently),
    ("InvalidQueueName", ProviderErrorKind::InvalidQueueName),
    ("InvalidVersionHeader", ProviderErrorKind::InvalidVersionHeader),
    ("InvalidContentType", ProviderErrorKind::InvalidContentType),
    ("QueueNameLengthError", ProviderErrorKind::QueueNameLengthError),
    ("QueueNotExist", ProviderErrorKind::QueueNotExist),
    ("ReceiptHandleError", ProviderErrorKind::ReceiptHandleError),
    ("SignatureDoesNotMatch", ProviderErrorKind::SignatureDoesNotMatch),
    ("TimeExpired", ProviderErrorKind::TimeExpired),
    ("QpsLimitExceeded", ProviderErrorKind::QpsLimitExceeded),
    ("TopicAlreadyExist", ProviderErrorKind::TopicAlreadyExist),
    ("TopicNameLengthError", ProviderErrorKind::TopicNameLengthError),
    ("TopicNotExist", ProviderErrorKind::TopicNotExist),
    (
        "SubscriptionNameLengthError",
        ProviderErrorKind::SubscriptionNameLengthError,
    ),
    ("TopicNameInvalid", ProviderErrorKind::InvalidTopicName),
    ("SubsriptionNameInvalid", ProviderErrorKind::InvalidSubscriptionName),
    ("SubscriptionAlreadyExist", ProviderErrorKind::SubscriptionAlreadyExist),
    ("EndpointInvalid", ProviderErrorKind::InvalidEndpoint),
    ("SubscriberNotExist", ProviderErrorKind::SubscriberNotExist),
];

impl ProviderErrorKind {
    /// Get the wire code for this kind (`"Unknown"` for unmapped codes)
    pub fn code(&self) -> &'static str {
        KNOWN_CODES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(code, _)| *code)
            .unwrap_or("Unknown")
    }

    /// Check if a retry of the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InternalError | Self::QpsLimitExceeded | Self::TimeExpired
        )
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Immutable code-to-kind table used by the response decoders
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    table: HashMap<&'static str, ProviderErrorKind>,
}

impl ErrorClassifier {
    /// Build a classifier from the service's documented error codes
    pub fn new() -> Self {
        Self {
            table: KNOWN_CODES.iter().copied().collect(),
        }
    }

    /// Process-wide classifier, built on first use and never mutated
    pub fn standard() -> &'static ErrorClassifier {
        static STANDARD: OnceLock<ErrorClassifier> = OnceLock::new();
        STANDARD.get_or_init(ErrorClassifier::new)
    }

    /// Map a provider error code to its typed kind
    pub fn kind_of(&self, code: &str) -> ProviderErrorKind {
        self.table
            .get(code)
            .copied()
            .unwrap_or(ProviderErrorKind::Unknown)
    }

    /// Classify a decoded error envelope for the resource being accessed
    pub fn classify(&self, envelope: ErrorResponse, resource: &str, status: u16) -> ProviderError {
        ProviderError {
            kind: self.kind_of(&envelope.code),
            status,
            code: envelope.code,
            message: envelope.message,
            request_id: envelope.request_id,
            host_id: envelope.host_id,
            resource: resource.to_string(),
        }
    }

    /// Number of known codes in the table
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the table holds no codes
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
